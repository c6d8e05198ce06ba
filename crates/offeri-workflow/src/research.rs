use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::violation::Violations;

/// External research the caller declares having performed (or skipped).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResearchSearch {
    /// The query sent to the web search tool
    #[serde(default)]
    pub query: String,
    /// Number of results requested; the documented default applies when omitted
    #[serde(default)]
    pub num_results: Option<u32>,
    /// Summary of what the search found (required unless skipped)
    #[serde(default)]
    pub findings: Option<String>,
    /// Report section this search supports: "curriculum", "admissions" or "outcomes"
    #[serde(default)]
    pub section: Option<String>,
    /// Mark the search as deliberately not performed
    #[serde(default)]
    pub skipped: bool,
    /// Knowledge-based reason for skipping (required when skipped)
    #[serde(default)]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResearchOutcome {
    Performed { findings: String },
    Skipped { justification: String },
}

/// A research declaration that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub query: String,
    pub num_results: u32,
    #[serde(flatten)]
    pub outcome: ResearchOutcome,
}

/// Count and result-size rules for one step's searches.
#[derive(Debug, Clone, Copy)]
pub struct SearchPolicy {
    pub min_searches: usize,
    pub max_searches: usize,
    pub min_results: u32,
    pub max_results: u32,
    pub default_results: u32,
    pub allow_skip: bool,
    pub min_query_chars: usize,
    pub min_findings_chars: usize,
    pub min_justification_chars: usize,
}

/// Validates every search in `searches`, reporting problems under `field[i]`.
/// Returns the accepted records; the caller decides whether to proceed based on `violations`.
pub fn validate_searches(
    field: &str,
    searches: &[ResearchSearch],
    policy: &SearchPolicy,
    violations: &mut Violations,
) -> Vec<ResearchRecord> {
    violations.require_count(
        field,
        searches.len(),
        policy.min_searches,
        policy.max_searches,
    );

    let mut records = Vec::with_capacity(searches.len());
    for (index, search) in searches.iter().enumerate() {
        let path = format!("{}[{}]", field, index);
        if let Some(record) = validate_search(&path, search, policy, violations) {
            records.push(record);
        }
    }
    records
}

fn validate_search(
    path: &str,
    search: &ResearchSearch,
    policy: &SearchPolicy,
    violations: &mut Violations,
) -> Option<ResearchRecord> {
    let before = violations.len();

    violations.require_text(
        &format!("{}.query", path),
        Some(search.query.as_str()),
        policy.min_query_chars,
    );

    let num_results = search.num_results.unwrap_or(policy.default_results);
    if num_results < policy.min_results || num_results > policy.max_results {
        let expected = if policy.min_results == policy.max_results {
            format!("exactly {}", policy.min_results)
        } else {
            format!("between {} and {}", policy.min_results, policy.max_results)
        };
        violations.push_detail(
            format!("{}.num_results", path),
            "result count out of range",
            expected,
            num_results.to_string(),
        );
    }

    let outcome = if search.skipped {
        if !policy.allow_skip {
            violations.push(
                format!("{}.skipped", path),
                "searches at this step must be performed, not skipped",
            );
        }
        if search.findings.is_some() {
            violations.push(
                format!("{}.findings", path),
                "a skipped search cannot declare findings",
            );
        }
        violations.require_text(
            &format!("{}.justification", path),
            search.justification.as_deref(),
            policy.min_justification_chars,
        );
        ResearchOutcome::Skipped {
            justification: search.justification.clone().unwrap_or_default(),
        }
    } else {
        violations.require_text(
            &format!("{}.findings", path),
            search.findings.as_deref(),
            policy.min_findings_chars,
        );
        ResearchOutcome::Performed {
            findings: search.findings.clone().unwrap_or_default(),
        }
    };

    (violations.len() == before).then(|| ResearchRecord {
        query: search.query.clone(),
        num_results,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SearchPolicy {
        SearchPolicy {
            min_searches: 0,
            max_searches: 3,
            min_results: 5,
            max_results: 10,
            default_results: 5,
            allow_skip: true,
            min_query_chars: 10,
            min_findings_chars: 100,
            min_justification_chars: 50,
        }
    }

    fn performed(query: &str) -> ResearchSearch {
        ResearchSearch {
            query: query.to_string(),
            findings: Some("f".repeat(120)),
            ..Default::default()
        }
    }

    #[test]
    fn omitted_result_count_takes_default() {
        let mut v = Violations::new();
        let records = validate_searches(
            "research_searches",
            &[performed("MIT admissions 2025")],
            &policy(),
            &mut v,
        );
        assert!(v.is_empty(), "{v}");
        assert_eq!(records[0].num_results, 5);
    }

    #[test]
    fn skipped_search_needs_justification() {
        let mut v = Violations::new();
        let search = ResearchSearch {
            query: "Stanford CS ranking".to_string(),
            skipped: true,
            justification: Some("too short".to_string()),
            ..Default::default()
        };
        validate_searches("research_searches", &[search], &policy(), &mut v);
        assert_eq!(v.len(), 1);
        assert_eq!(
            v.iter().next().unwrap().field,
            "research_searches[0].justification"
        );
    }

    #[test]
    fn reports_all_problems_across_searches() {
        let mut v = Violations::new();
        let bad = ResearchSearch {
            query: "short".to_string(),
            num_results: Some(50),
            findings: None,
            ..Default::default()
        };
        let searches = vec![bad.clone(), bad.clone(), bad.clone(), bad];
        validate_searches("research_searches", &searches, &policy(), &mut v);
        // count + 4 x (query, num_results, findings)
        assert_eq!(v.len(), 13);
    }
}
