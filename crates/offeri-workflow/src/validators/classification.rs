use offeri_core::{is_classification, WorkflowConfig, CLASSIFICATIONS};

use crate::error::Result;
use crate::validators::duplicates;
use crate::violation::{one_of, Violations};

pub fn validate_classifications(selected: &[String], config: &WorkflowConfig) -> Result<Vec<String>> {
    let mut violations = Violations::new();

    violations.require_count(
        "selected_classifications",
        selected.len(),
        1,
        config.max_classifications,
    );

    for (index, name) in selected.iter().enumerate() {
        if !is_classification(name) {
            violations.push_detail(
                format!("selected_classifications[{}]", index),
                "not a classification name",
                one_of(CLASSIFICATIONS),
                format!("\"{}\"", name),
            );
        }
    }

    for name in duplicates(selected) {
        violations.push(
            "selected_classifications",
            format!("\"{}\" is listed more than once", name),
        );
    }

    violations.into_result(selected.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_exact_names() {
        let chosen = names(&["Computer Science & IT", "Data Science & Analytics"]);
        assert_eq!(
            validate_classifications(&chosen, &WorkflowConfig::default()).unwrap(),
            chosen
        );
    }

    #[test]
    fn rejects_near_misses_and_lists_valid_names() {
        let chosen = names(&["computer science & it", "Engineering ", "Law"]);
        let err = validate_classifications(&chosen, &WorkflowConfig::default()).unwrap_err();
        let violations = match err {
            WorkflowError::ContractViolation(v) => v,
            other => panic!("unexpected error: {other:?}"),
        };
        assert_eq!(violations.len(), 2);
        let first = violations.iter().next().unwrap();
        assert!(first
            .expected
            .as_deref()
            .unwrap()
            .contains("\"Computer Science & IT\""));
    }

    #[test]
    fn empty_and_oversized_choices_rejected() {
        let config = WorkflowConfig::default();
        assert!(validate_classifications(&[], &config).is_err());
        let six = names(&CLASSIFICATIONS[..6]);
        assert!(validate_classifications(&six, &config).is_err());
    }
}
