use offeri_core::{ProgramId, ProgramSummary};
use serde::Serialize;

use crate::payload::{RankedProgram, UniversityCandidates};
use crate::policy::{ReportScale, ScoreWeights, StrategyRatios, TierCounts};

#[derive(Debug, Clone, Serialize)]
pub struct UniverseListing {
    pub country: String,
    pub universities: Vec<String>,
    pub university_count: usize,
    pub strategy: String,
    pub strategy_ratios: StrategyRatios,
    pub max_selectable: usize,
    pub guidance: Vec<String>,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionConfirmed {
    pub selection_token: String,
    pub country: String,
    pub selected_universities: Vec<String>,
    pub strategy: String,
    pub strategy_ratios: StrategyRatios,
    pub research_recorded: usize,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SelectUniversitiesResponse {
    Universe(UniverseListing),
    Confirmed(SelectionConfirmed),
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationListing {
    pub classifications: Vec<String>,
    pub max_selectable: usize,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationConfirmed {
    pub classification_token: String,
    pub selected_classifications: Vec<String>,
    pub universities: Vec<String>,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SelectClassificationsResponse {
    Listing(ClassificationListing),
    Confirmed(ClassificationConfirmed),
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversityPrograms {
    pub university: String,
    pub program_count: usize,
    pub programs: Vec<ProgramSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReview {
    pub batch: Vec<UniversityPrograms>,
    pub target_universities: Vec<String>,
    pub remaining: Vec<String>,
    pub is_complete: bool,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAccepted {
    pub batch_token: String,
    pub accepted: Vec<UniversityCandidates>,
    pub processed_count: usize,
    pub remaining: Vec<String>,
    pub is_complete: bool,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FilterProgramsResponse {
    Review(BatchReview),
    Accepted(BatchAccepted),
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisAccepted {
    pub analysis_token: String,
    pub university: String,
    pub shortlisted_program_ids: Vec<ProgramId>,
    pub analyzed: Vec<String>,
    pub remaining: Vec<String>,
    pub is_complete: bool,
    pub total_shortlisted: usize,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalSelectionAccepted {
    pub final_selection_token: String,
    pub count: usize,
    pub minimum_required: usize,
    pub programs: Vec<ProgramSummary>,
    pub tier_guidance: StrategyRatios,
    pub tier_targets: TierCounts,
    pub report_scale: ReportScale,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingIssued {
    pub ranking_token: String,
    pub career_clarity: String,
    pub weights: ScoreWeights,
    pub report_scale: ReportScale,
    pub detailed_programs: Vec<RankedProgram>,
    pub concise_programs: Vec<RankedProgram>,
    pub searches_per_detailed_program: usize,
    pub results_per_search: u32,
    pub research_sections: Vec<String>,
    pub required_sections: Vec<String>,
    pub concise_fields: Vec<String>,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportAccepted {
    pub status: String,
    pub detailed_programs: usize,
    pub concise_programs: usize,
    pub report_outline: Vec<String>,
    pub next_step: String,
}
