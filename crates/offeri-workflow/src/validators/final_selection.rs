use offeri_core::ProgramId;
use std::collections::HashSet;

use crate::validators::duplicates;
use crate::violation::Violations;

/// The merged list must be drawn from the shortlists and reach the report minimum.
/// There is no upper bound.
pub fn validate_final_selection(
    program_ids: &[ProgramId],
    shortlisted: &[ProgramId],
    minimum: usize,
    violations: &mut Violations,
) {
    let allowed: HashSet<ProgramId> = shortlisted.iter().copied().collect();

    for (index, id) in program_ids.iter().enumerate() {
        if !allowed.contains(id) {
            violations.push(
                format!("final_program_ids[{}]", index),
                format!("program {} was not shortlisted during analysis", id),
            );
        }
    }

    for id in duplicates(program_ids) {
        violations.push(
            "final_program_ids",
            format!("program {} is listed more than once", id),
        );
    }

    let distinct: HashSet<&ProgramId> = program_ids.iter().collect();
    if distinct.len() < minimum {
        violations.push_detail(
            "final_program_ids",
            "not enough programs to fill the report",
            format!("at least {}", minimum),
            distinct.len().to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_must_reach_minimum() {
        let shortlisted: Vec<ProgramId> = (1..=30).collect();
        let mut v = Violations::new();
        validate_final_selection(&(1..=19).collect::<Vec<_>>(), &shortlisted, 20, &mut v);
        let violation = v.iter().next().unwrap();
        assert_eq!(violation.expected.as_deref(), Some("at least 20"));
        assert_eq!(violation.actual.as_deref(), Some("19"));

        let mut v = Violations::new();
        validate_final_selection(&(1..=25).collect::<Vec<_>>(), &shortlisted, 20, &mut v);
        assert!(v.is_empty());
    }

    #[test]
    fn unknown_and_duplicate_ids_rejected() {
        let mut v = Violations::new();
        validate_final_selection(&[1, 2, 2, 99], &[1, 2, 3], 2, &mut v);
        assert_eq!(v.len(), 2);
    }
}
