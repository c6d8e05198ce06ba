use offeri_core::{ProgramId, WorkflowConfig};
use std::collections::{BTreeMap, HashSet};

use crate::payload::{ShortlistEntry, UniversityAnalysis};
use crate::requests::AnalyzeProgramsRequest;
use crate::research::{validate_searches, SearchPolicy};
use crate::validators::duplicates;
use crate::violation::Violations;

pub fn analysis_search_policy(config: &WorkflowConfig) -> SearchPolicy {
    SearchPolicy {
        min_searches: 0,
        max_searches: config.max_analysis_searches,
        min_results: config.analysis_results_min,
        max_results: config.analysis_results_max,
        default_results: config.analysis_results_default,
        allow_skip: true,
        min_query_chars: config.min_query_chars,
        min_findings_chars: config.min_findings_chars,
        min_justification_chars: config.min_justification_chars,
    }
}

/// Checks one university's analysis against the filtering outcome and prior analyses.
pub fn validate_analysis(
    request: &AnalyzeProgramsRequest,
    targets: &[String],
    candidates: &BTreeMap<String, Vec<ProgramId>>,
    analyzed: &BTreeMap<String, UniversityAnalysis>,
    config: &WorkflowConfig,
    violations: &mut Violations,
) -> UniversityAnalysis {
    let university = request.university.as_str();

    if !targets.iter().any(|t| t == university) {
        violations.push_detail(
            "university",
            format!("\"{}\" has no filtered candidates to analyse", university),
            targets.join(", "),
            format!("\"{}\"", university),
        );
    } else if analyzed.contains_key(university) {
        violations.push(
            "university",
            format!("\"{}\" was already analysed", university),
        );
    }

    let allowed: HashSet<ProgramId> = candidates
        .get(university)
        .map(|ids| ids.iter().copied().collect())
        .unwrap_or_default();

    if request.shortlist.is_empty() {
        violations.push_detail(
            "shortlist",
            "shortlist must keep at least one program",
            "at least 1 entry",
            "0",
        );
    }

    let mut shortlist = Vec::with_capacity(request.shortlist.len());
    for (index, entry) in request.shortlist.iter().enumerate() {
        let field = format!("shortlist[{}]", index);
        if !allowed.contains(&entry.program_id) {
            violations.push(
                format!("{}.program_id", field),
                format!(
                    "program {} was not kept for {} during filtering",
                    entry.program_id, university
                ),
            );
        }
        violations.require_text(
            &format!("{}.fit_note", field),
            Some(entry.fit_note.as_str()),
            config.min_fit_note_chars,
        );
        shortlist.push(ShortlistEntry {
            program_id: entry.program_id,
            fit_note: entry.fit_note.trim().to_string(),
        });
    }

    let ids: Vec<ProgramId> = request.shortlist.iter().map(|e| e.program_id).collect();
    for id in duplicates(&ids) {
        violations.push("shortlist", format!("program {} is listed more than once", id));
    }

    let research = validate_searches(
        "research_searches",
        &request.research_searches,
        &analysis_search_policy(config),
        violations,
    );

    UniversityAnalysis {
        university: university.to_string(),
        shortlist,
        research,
    }
}
