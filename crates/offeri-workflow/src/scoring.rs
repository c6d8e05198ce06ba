use offeri_core::Program;
use std::cmp::Ordering;

use crate::payload::RankedProgram;
use crate::policy::CareerClarity;

/// Fit assigned to every candidate that survived analysis.
pub const VALIDATED_FIT: f64 = 80.0;

/// Source of a university's reputation on a 0-100 scale.
pub trait ReputationLookup: Send + Sync {
    fn reputation(&self, university: &str) -> f64;
}

/// Substring-membership heuristic over institution names in four tiers.
///
/// This is a rough prior, not ranking data; swap in another
/// [`ReputationLookup`] when a real source is available.
pub struct KeywordReputation {
    tiers: Vec<(f64, Vec<String>)>,
    fallback: f64,
}

impl KeywordReputation {
    pub fn new(tiers: Vec<(f64, Vec<String>)>, fallback: f64) -> Self {
        let tiers = tiers
            .into_iter()
            .map(|(score, keywords)| {
                (
                    score,
                    keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { tiers, fallback }
    }
}

impl Default for KeywordReputation {
    fn default() -> Self {
        let tier = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        Self::new(
            vec![
                (
                    95.0,
                    tier(&[
                        "massachusetts institute of technology",
                        "stanford",
                        "harvard",
                        "oxford",
                        "cambridge",
                        "california institute of technology",
                        "eth zurich",
                        "imperial college",
                    ]),
                ),
                (
                    85.0,
                    tier(&[
                        "princeton",
                        "yale",
                        "columbia",
                        "chicago",
                        "berkeley",
                        "carnegie mellon",
                        "university college london",
                        "national university of singapore",
                        "toronto",
                        "tsinghua",
                        "peking",
                    ]),
                ),
                (
                    75.0,
                    tier(&[
                        "university of",
                        "technical university",
                        "polytechnic",
                        "king's college",
                        "mcgill",
                        "melbourne",
                        "sydney",
                    ]),
                ),
                (65.0, tier(&["state university", "college", "institute"])),
            ],
            60.0,
        )
    }
}

impl ReputationLookup for KeywordReputation {
    fn reputation(&self, university: &str) -> f64 {
        let name = university.to_lowercase();
        self.tiers
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k.as_str())))
            .map(|(score, _)| *score)
            .unwrap_or(self.fallback)
    }
}

/// Scores and orders programs: descending score, ties broken by ascending id.
/// Ranks start at 1.
pub fn rank_programs(
    programs: &[Program],
    clarity: CareerClarity,
    reputation: &dyn ReputationLookup,
) -> Vec<RankedProgram> {
    let weights = clarity.weights();
    let mut ranked: Vec<RankedProgram> = programs
        .iter()
        .map(|program| {
            let rep = reputation.reputation(&program.university_name);
            let score = rep * weights.reputation + VALIDATED_FIT * weights.fit;
            RankedProgram {
                rank: 0,
                program_id: program.program_id,
                program_name: program.program_name.clone(),
                university: program.university_name.clone(),
                reputation: rep,
                fit: VALIDATED_FIT,
                score: (score * 100.0).round() / 100.0,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.program_id.cmp(&b.program_id))
    });
    for (index, program) in ranked.iter_mut().enumerate() {
        program.rank = index + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<&'static str, f64>);

    impl ReputationLookup for Fixed {
        fn reputation(&self, university: &str) -> f64 {
            self.0.get(university).copied().unwrap_or(50.0)
        }
    }

    fn program(id: i64, university: &str) -> Program {
        Program {
            program_id: id,
            program_name: format!("Program {id}"),
            university_name: university.to_string(),
            country: "USA".to_string(),
            city: None,
            degree_type: Some("Master".to_string()),
            duration_months: Some(12),
            is_part_time: false,
            classifications: vec![],
        }
    }

    fn fixture() -> Fixed {
        Fixed(HashMap::from([("Top", 100.0), ("Mid", 70.0), ("Low", 40.0)]))
    }

    #[test]
    fn low_clarity_favours_reputation() {
        let programs = vec![program(1, "Low"), program(2, "Top"), program(3, "Mid")];
        let ranked = rank_programs(&programs, CareerClarity::Low, &fixture());
        let order: Vec<_> = ranked.iter().map(|p| p.program_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        // 100 * 0.7 + 80 * 0.3
        assert!((ranked[0].score - 94.0).abs() < 1e-9);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn high_clarity_compresses_reputation_spread() {
        let programs = vec![program(1, "Top"), program(2, "Low")];
        let low = rank_programs(&programs, CareerClarity::Low, &fixture());
        let high = rank_programs(&programs, CareerClarity::High, &fixture());
        let spread = |r: &[RankedProgram]| r[0].score - r[1].score;
        assert!(spread(&high) < spread(&low));
    }

    #[test]
    fn ties_break_by_program_id() {
        let programs = vec![program(9, "Mid"), program(4, "Mid"), program(6, "Mid")];
        let ranked = rank_programs(&programs, CareerClarity::Medium, &fixture());
        let order: Vec<_> = ranked.iter().map(|p| p.program_id).collect();
        assert_eq!(order, vec![4, 6, 9]);
    }

    #[test]
    fn keyword_tiers_match_case_insensitively() {
        let lookup = KeywordReputation::default();
        assert_eq!(lookup.reputation("Stanford University"), 95.0);
        assert_eq!(lookup.reputation("University of Toronto"), 85.0);
        assert_eq!(lookup.reputation("University of Leeds"), 75.0);
        assert_eq!(lookup.reputation("Ohio State University"), 65.0);
        assert_eq!(lookup.reputation("Aalto"), 60.0);
    }
}
