use offeri_core::WorkflowConfig;
use std::collections::HashSet;

use crate::policy::Strategy;
use crate::research::SearchPolicy;
use crate::validators::duplicates;
use crate::violation::{one_of, Violations};

/// Checks the fields shared by both selection calls.
pub fn validate_profile(
    background: &str,
    strategy: &str,
    config: &WorkflowConfig,
    violations: &mut Violations,
) -> Option<Strategy> {
    violations.require_text("background", Some(background), config.min_background_chars);

    let parsed = Strategy::parse(strategy);
    if parsed.is_none() {
        violations.push_detail(
            "strategy",
            "unknown strategy",
            one_of(Strategy::NAMES),
            format!("\"{}\"", strategy),
        );
    }
    parsed
}

/// Checks the confirmed subset against the enumerated universe.
pub fn validate_university_choice(
    selected: &[String],
    universe: &[String],
    config: &WorkflowConfig,
    violations: &mut Violations,
) {
    violations.require_count(
        "selected_universities",
        selected.len(),
        1,
        config.max_selected_universities,
    );

    let known: HashSet<&str> = universe.iter().map(String::as_str).collect();
    for (index, name) in selected.iter().enumerate() {
        if !known.contains(name.as_str()) {
            violations.push_detail(
                format!("selected_universities[{}]", index),
                format!("\"{}\" is not in the list returned for this country", name),
                "an exact name from the enumerated list",
                format!("\"{}\"", name),
            );
        }
    }

    for name in duplicates(selected) {
        violations.push(
            "selected_universities",
            format!("\"{}\" is listed more than once", name),
        );
    }
}

pub fn selection_search_policy(config: &WorkflowConfig) -> SearchPolicy {
    SearchPolicy {
        min_searches: 0,
        max_searches: config.max_selection_searches,
        min_results: config.selection_results_min,
        max_results: config.selection_results_max,
        default_results: config.selection_results_default,
        allow_skip: true,
        min_query_chars: config.min_query_chars,
        min_findings_chars: config.min_findings_chars,
        min_justification_chars: config.min_justification_chars,
    }
}
