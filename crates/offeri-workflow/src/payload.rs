// ABOUTME: Step payloads carried by continuation tokens, one variant per workflow step
// ABOUTME: StepData ties each payload struct to its StepKind for typed token access

use offeri_core::ProgramId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::policy::{CareerClarity, ReportScale, ScoreWeights, Strategy, StrategyRatios};
use crate::research::ResearchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Selection,
    Classification,
    ProgramBatch,
    Analysis,
    FinalSelection,
    Ranking,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::Classification => "classification",
            Self::ProgramBatch => "program_batch",
            Self::Analysis => "analysis",
            Self::FinalSelection => "final_selection",
            Self::Ranking => "ranking",
        }
    }

    /// Short prefix baked into minted tokens, useful when reading logs.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            Self::Selection => "sel",
            Self::Classification => "cls",
            Self::ProgramBatch => "batch",
            Self::Analysis => "ana",
            Self::FinalSelection => "final",
            Self::Ranking => "rank",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts fixed at selection time and carried through every later step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultationContext {
    pub background: String,
    pub country: String,
    pub strategy: Strategy,
    pub universities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionPayload {
    pub context: ConsultationContext,
    pub research: Vec<ResearchRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationPayload {
    pub context: ConsultationContext,
    pub classifications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniversityCandidates {
    pub university: String,
    pub program_ids: Vec<ProgramId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramBatchPayload {
    pub context: ConsultationContext,
    pub classifications: Vec<String>,
    /// Original, complete target list in selection order
    pub target_universities: Vec<String>,
    /// Shortlists submitted by the call that minted this token
    pub delta: Vec<UniversityCandidates>,
    /// Union of every shortlist submitted so far
    pub accumulated: BTreeMap<String, Vec<ProgramId>>,
}

impl ProgramBatchPayload {
    pub fn remaining(&self) -> Vec<String> {
        remaining_in_order(&self.target_universities, |u| {
            self.accumulated.contains_key(u)
        })
    }

    pub fn is_complete(&self) -> bool {
        self.remaining().is_empty()
    }

    /// At least one accepted shortlist names a program.
    pub fn has_candidates(&self) -> bool {
        self.accumulated.values().any(|ids| !ids.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistEntry {
    pub program_id: ProgramId,
    pub fit_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniversityAnalysis {
    pub university: String,
    pub shortlist: Vec<ShortlistEntry>,
    pub research: Vec<ResearchRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPayload {
    pub context: ConsultationContext,
    /// Universities that came out of program filtering with candidates
    pub target_universities: Vec<String>,
    pub candidates: BTreeMap<String, Vec<ProgramId>>,
    pub delta: UniversityAnalysis,
    pub accumulated: BTreeMap<String, UniversityAnalysis>,
}

impl AnalysisPayload {
    pub fn remaining(&self) -> Vec<String> {
        remaining_in_order(&self.target_universities, |u| {
            self.accumulated.contains_key(u)
        })
    }

    pub fn is_complete(&self) -> bool {
        self.remaining().is_empty()
    }

    /// Every program id shortlisted across all analysed universities.
    pub fn shortlisted_ids(&self) -> Vec<ProgramId> {
        self.accumulated
            .values()
            .flat_map(|analysis| analysis.shortlist.iter().map(|entry| entry.program_id))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSelectionPayload {
    pub context: ConsultationContext,
    pub program_ids: Vec<ProgramId>,
    pub count: usize,
    /// Recommended band mix; guidance only, never enforced
    pub tier_guidance: StrategyRatios,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProgram {
    pub rank: usize,
    pub program_id: ProgramId,
    pub program_name: String,
    pub university: String,
    pub reputation: f64,
    pub fit: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingPayload {
    pub context: ConsultationContext,
    pub career_clarity: CareerClarity,
    pub weights: ScoreWeights,
    pub report_scale: ReportScale,
    pub detailed: Vec<RankedProgram>,
    pub concise: Vec<RankedProgram>,
    pub searches_per_detailed_program: usize,
}

/// Tagged union stored behind every continuation token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", content = "payload", rename_all = "snake_case")]
pub enum StepPayload {
    Selection(SelectionPayload),
    Classification(ClassificationPayload),
    ProgramBatch(ProgramBatchPayload),
    Analysis(AnalysisPayload),
    FinalSelection(FinalSelectionPayload),
    Ranking(RankingPayload),
}

impl StepPayload {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Selection(_) => StepKind::Selection,
            Self::Classification(_) => StepKind::Classification,
            Self::ProgramBatch(_) => StepKind::ProgramBatch,
            Self::Analysis(_) => StepKind::Analysis,
            Self::FinalSelection(_) => StepKind::FinalSelection,
            Self::Ranking(_) => StepKind::Ranking,
        }
    }
}

/// A payload struct that can be stored behind, and fetched from, a token.
pub trait StepData: Sized {
    const KIND: StepKind;

    fn from_payload(payload: StepPayload) -> Option<Self>;

    fn into_payload(self) -> StepPayload;
}

macro_rules! step_data {
    ($ty:ty, $variant:ident) => {
        impl StepData for $ty {
            const KIND: StepKind = StepKind::$variant;

            fn from_payload(payload: StepPayload) -> Option<Self> {
                match payload {
                    StepPayload::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_payload(self) -> StepPayload {
                StepPayload::$variant(self)
            }
        }
    };
}

step_data!(SelectionPayload, Selection);
step_data!(ClassificationPayload, Classification);
step_data!(ProgramBatchPayload, ProgramBatch);
step_data!(AnalysisPayload, Analysis);
step_data!(FinalSelectionPayload, FinalSelection);
step_data!(RankingPayload, Ranking);

fn remaining_in_order<F>(targets: &[String], processed: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    targets
        .iter()
        .filter(|u| !processed(u.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ConsultationContext {
        ConsultationContext {
            background: "CS undergraduate with two internships".to_string(),
            country: "USA".to_string(),
            strategy: Strategy::Conservative,
            universities: vec!["A".into(), "B".into(), "C".into()],
        }
    }

    #[test]
    fn remaining_keeps_target_order() {
        let mut accumulated = BTreeMap::new();
        accumulated.insert("B".to_string(), vec![2]);
        let batch = ProgramBatchPayload {
            context: context(),
            classifications: vec!["Engineering".into()],
            target_universities: vec!["C".into(), "B".into(), "A".into()],
            delta: vec![],
            accumulated,
        };
        assert_eq!(batch.remaining(), vec!["C".to_string(), "A".to_string()]);
        assert!(!batch.is_complete());
    }

    #[test]
    fn step_data_round_trips_through_payload() {
        let selection = SelectionPayload {
            context: context(),
            research: vec![],
        };
        let payload = selection.clone().into_payload();
        assert_eq!(payload.kind(), StepKind::Selection);
        assert_eq!(SelectionPayload::from_payload(payload.clone()), Some(selection));
        assert_eq!(ClassificationPayload::from_payload(payload), None);
    }
}
