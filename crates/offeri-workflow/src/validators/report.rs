use offeri_core::{ProgramId, WorkflowConfig};
use std::collections::{BTreeSet, HashSet};

use crate::error::Result;
use crate::payload::{RankedProgram, RankingPayload};
use crate::policy::ResearchSection;
use crate::requests::{ConciseProgramReport, DetailedProgramReport, ValidateReportRequest};
use crate::research::{validate_searches, ResearchSearch, SearchPolicy};
use crate::validators::duplicates;
use crate::violation::{one_of, Violations};

/// Detailed-tier research is mandatory: a fixed number of searches at a fixed result size.
pub fn detailed_search_policy(config: &WorkflowConfig, searches: usize) -> SearchPolicy {
    SearchPolicy {
        min_searches: searches,
        max_searches: searches,
        min_results: config.detailed_results_per_search,
        max_results: config.detailed_results_per_search,
        default_results: config.detailed_results_per_search,
        allow_skip: false,
        min_query_chars: config.min_query_chars,
        min_findings_chars: config.min_findings_chars,
        min_justification_chars: config.min_justification_chars,
    }
}

/// Validates the whole report against the ranking it was written for and
/// returns the report outline on success.
pub fn validate_report(
    request: &ValidateReportRequest,
    ranking: &RankingPayload,
    config: &WorkflowConfig,
) -> Result<Vec<String>> {
    let mut violations = Violations::new();

    let detailed_ids: Vec<ProgramId> = request.detailed_programs.iter().map(|p| p.program_id).collect();
    check_coverage("detailed_programs", &detailed_ids, &ranking.detailed, &mut violations);

    let policy = detailed_search_policy(config, ranking.searches_per_detailed_program);
    for program in &request.detailed_programs {
        validate_detailed(program, &policy, config, &mut violations);
    }

    let concise_ids: Vec<ProgramId> = request.concise_programs.iter().map(|p| p.program_id).collect();
    check_coverage("concise_programs", &concise_ids, &ranking.concise, &mut violations);

    for program in &request.concise_programs {
        validate_concise(program, config, &mut violations);
    }

    violations.require_text(
        "application_strategy",
        request.application_strategy.as_deref(),
        config.min_strategy_chars,
    );

    violations.into_result(report_outline(ranking))
}

/// Submitted ids must equal the tier exactly: nothing missing, nothing extra, no repeats.
fn check_coverage(
    field: &str,
    submitted: &[ProgramId],
    tier: &[RankedProgram],
    violations: &mut Violations,
) {
    let expected: BTreeSet<ProgramId> = tier.iter().map(|p| p.program_id).collect();
    let given: BTreeSet<ProgramId> = submitted.iter().copied().collect();

    let missing: Vec<String> = expected.difference(&given).map(|id| id.to_string()).collect();
    if !missing.is_empty() {
        violations.push_detail(
            field,
            format!("missing programs: {}", missing.join(", ")),
            format_ids(&expected),
            format_ids(&given),
        );
    }

    for id in given.difference(&expected) {
        violations.push(
            field,
            format!("program {} is not in this tier of the ranking", id),
        );
    }

    for id in duplicates(submitted) {
        violations.push(field, format!("program {} is reported more than once", id));
    }
}

fn validate_detailed(
    program: &DetailedProgramReport,
    policy: &SearchPolicy,
    config: &WorkflowConfig,
    violations: &mut Violations,
) {
    let prefix = format!("detailed_programs[program {}]", program.program_id);

    validate_searches(
        &format!("{}.research_searches", prefix),
        &program.research_searches,
        policy,
        violations,
    );
    check_sections(&prefix, &program.research_searches, violations);

    for (name, value) in program.sections() {
        violations.require_text(
            &format!("{}.{}", prefix, name),
            value,
            config.min_section_chars,
        );
    }
}

/// Each research section must be covered by exactly one search.
fn check_sections(prefix: &str, searches: &[ResearchSearch], violations: &mut Violations) {
    let mut covered = Vec::with_capacity(searches.len());

    for (index, search) in searches.iter().enumerate() {
        let field = format!("{}.research_searches[{}].section", prefix, index);
        match search.section.as_deref() {
            None => violations.push_detail(
                field,
                "required field is missing",
                one_of(ResearchSection::NAMES),
                "missing",
            ),
            Some(value) => match ResearchSection::parse(value) {
                Some(section) => covered.push(section),
                None => violations.push_detail(
                    field,
                    "unknown research section",
                    one_of(ResearchSection::NAMES),
                    format!("\"{}\"", value),
                ),
            },
        }
    }

    let seen: HashSet<ResearchSection> = covered.iter().copied().collect();
    for section in ResearchSection::ALL {
        if !seen.contains(&section) {
            violations.push(
                format!("{}.research_searches", prefix),
                format!("no search covers the {} section", section.as_str()),
            );
        }
    }
    for section in duplicates(&covered) {
        violations.push(
            format!("{}.research_searches", prefix),
            format!("the {} section is covered more than once", section.as_str()),
        );
    }
}

fn validate_concise(
    program: &ConciseProgramReport,
    config: &WorkflowConfig,
    violations: &mut Violations,
) {
    for (name, value) in program.fields() {
        violations.require_text(
            &format!("concise_programs[program {}].{}", program.program_id, name),
            value,
            config.min_summary_chars,
        );
    }
}

fn report_outline(ranking: &RankingPayload) -> Vec<String> {
    let context = &ranking.context;
    let mut outline = vec![format!(
        "Graduate program recommendations for {} ({} strategy, {} universities)",
        context.country,
        context.strategy,
        context.universities.len()
    )];

    outline.push(format!(
        "Part 1: In-depth analysis of {} programs",
        ranking.detailed.len()
    ));
    outline.extend(ranking.detailed.iter().map(outline_line));

    outline.push(format!(
        "Part 2: Concise overview of {} programs",
        ranking.concise.len()
    ));
    outline.extend(ranking.concise.iter().map(outline_line));

    outline.push("Part 3: Application strategy".to_string());
    outline
}

fn outline_line(program: &RankedProgram) -> String {
    format!(
        "  {}. {} - {} (score {:.2})",
        program.rank, program.program_name, program.university, program.score
    )
}

fn format_ids(ids: &BTreeSet<ProgramId>) -> String {
    let parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
