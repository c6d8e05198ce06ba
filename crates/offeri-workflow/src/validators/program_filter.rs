use offeri_core::{ProgramId, ProgramSummary, WorkflowConfig};
use std::collections::{BTreeMap, HashSet};

use crate::error::Result;
use crate::payload::UniversityCandidates;
use crate::validators::duplicates;
use crate::violation::Violations;

/// A caller-supplied target list must name exactly the selected universities.
pub fn validate_target_list(given: &[String], expected: &[String], violations: &mut Violations) {
    let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let given_set: HashSet<&str> = given.iter().map(String::as_str).collect();

    for name in duplicates(given) {
        violations.push(
            "all_selected_universities",
            format!("\"{}\" is listed more than once", name),
        );
    }

    if given_set != expected_set {
        violations.push_detail(
            "all_selected_universities",
            "must list exactly the universities confirmed at selection",
            expected.join(", "),
            given.join(", "),
        );
    }
}

/// Checks one batch of universities against the target list and what was already processed.
pub fn validate_batch(
    universities: &[String],
    target: &[String],
    processed: &BTreeMap<String, Vec<ProgramId>>,
    config: &WorkflowConfig,
    violations: &mut Violations,
) {
    violations.require_count(
        "universities",
        universities.len(),
        1,
        config.max_universities_per_batch,
    );

    for (index, name) in universities.iter().enumerate() {
        let field = format!("universities[{}]", index);
        if !target.contains(name) {
            violations.push_detail(
                field,
                format!("\"{}\" is not in the target list", name),
                target.join(", "),
                format!("\"{}\"", name),
            );
        } else if processed.contains_key(name) {
            violations.push(
                field,
                format!("\"{}\" was already processed in an earlier batch", name),
            );
        }
    }

    for name in duplicates(universities) {
        violations.push(
            "universities",
            format!("\"{}\" appears twice in this batch", name),
        );
    }
}

/// Checks the submitted shortlists against the programs retrieved for the batch.
/// A university whose retrieval came back empty may submit an empty shortlist.
pub fn validate_shortlists(
    batch: &[String],
    shortlists: &BTreeMap<String, Vec<ProgramId>>,
    retrieved: &BTreeMap<String, Vec<ProgramSummary>>,
) -> Result<Vec<UniversityCandidates>> {
    let mut violations = Violations::new();
    let mut delta = Vec::with_capacity(batch.len());

    for university in batch {
        let field = format!("shortlists[\"{}\"]", university);
        let Some(ids) = shortlists.get(university) else {
            violations.push(field, "missing shortlist for a university in this batch");
            continue;
        };

        let available: HashSet<ProgramId> = retrieved
            .get(university)
            .map(|programs| programs.iter().map(|p| p.program_id).collect())
            .unwrap_or_default();

        if ids.is_empty() && !available.is_empty() {
            violations.push_detail(
                field.clone(),
                "shortlist must keep at least one program",
                "at least 1 program id",
                "0",
            );
        }

        for id in ids {
            if !available.contains(id) {
                violations.push(
                    field.clone(),
                    format!("program {} was not retrieved for {}", id, university),
                );
            }
        }

        for id in duplicates(ids) {
            violations.push(field.clone(), format!("program {} is listed more than once", id));
        }

        delta.push(UniversityCandidates {
            university: university.clone(),
            program_ids: ids.clone(),
        });
    }

    for key in shortlists.keys() {
        if !batch.contains(key) {
            violations.push(
                format!("shortlists[\"{}\"]", key),
                "university is not part of this batch",
            );
        }
    }

    violations.into_result(delta)
}
