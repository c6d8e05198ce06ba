// ABOUTME: Argument structs for each workflow step, shared by the engine and the MCP tools
// ABOUTME: Enum-like fields stay strings so the validators can report them alongside other violations

use offeri_core::ProgramId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::research::ResearchSearch;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SelectUniversitiesRequest {
    /// Student background: degree, grades, experience, goals
    pub background: String,
    /// Target country, exactly as listed by get_available_countries (e.g. "USA")
    pub country: String,
    /// Portfolio strategy: "conservative" or "aggressive"
    pub strategy: String,
    /// Omit to list every university in the country; supply to confirm the choice
    #[serde(default)]
    pub selected_universities: Option<Vec<String>>,
    /// Optional background research (0-3 searches, 5-10 results each)
    #[serde(default)]
    pub research_searches: Vec<ResearchSearch>,
    /// Consultation API key (sk_...); falls back to the server's configured key
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SelectClassificationsRequest {
    /// Token returned by select_universities
    pub selection_token: String,
    /// Omit to list the taxonomy; supply 1-5 exact names to confirm
    #[serde(default)]
    pub selected_classifications: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FilterProgramsRequest {
    /// Token from select_classifications (first batch only)
    #[serde(default)]
    pub classification_token: Option<String>,
    /// Token from the previous filter_programs call (every later batch)
    #[serde(default)]
    pub previous_batch_token: Option<String>,
    /// Complete target list; must equal the selected universities. Filled in when omitted.
    #[serde(default)]
    pub all_selected_universities: Option<Vec<String>>,
    /// Universities in this batch (1-3, not yet processed)
    pub universities: Vec<String>,
    /// Omit to review the batch's programs; supply university -> program ids to confirm
    #[serde(default)]
    pub shortlists: Option<BTreeMap<String, Vec<ProgramId>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ShortlistInput {
    pub program_id: ProgramId,
    /// Why this program fits the student
    #[serde(default)]
    pub fit_note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeProgramsRequest {
    /// Completed token from filter_programs (first university only)
    #[serde(default)]
    pub batch_token: Option<String>,
    /// Token from the previous analyze_programs call (every later university)
    #[serde(default)]
    pub previous_analysis_token: Option<String>,
    /// The one university analysed in this call
    pub university: String,
    /// Shortlisted programs with a fit note each
    #[serde(default)]
    pub shortlist: Vec<ShortlistInput>,
    /// Optional deep-dive research (0-2 searches, 5-25 results each)
    #[serde(default)]
    pub research_searches: Vec<ResearchSearch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FinalizeSelectionRequest {
    /// Completed token from analyze_programs
    pub analysis_token: String,
    /// Final merged program ids, drawn from the analysis shortlists
    pub final_program_ids: Vec<ProgramId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScoreAndRankRequest {
    /// Token from finalize_selection
    pub final_selection_token: String,
    /// How settled the student's career direction is: "high", "medium" or "low"
    pub career_clarity: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DetailedProgramReport {
    pub program_id: ProgramId,
    /// Exactly 3 searches: one each for curriculum, admissions and outcomes, 15 results each
    #[serde(default)]
    pub research_searches: Vec<ResearchSearch>,
    #[serde(default)]
    pub location_environment: Option<String>,
    #[serde(default)]
    pub career_outcomes: Option<String>,
    #[serde(default)]
    pub program_intensity: Option<String>,
    #[serde(default)]
    pub unique_features: Option<String>,
    #[serde(default)]
    pub application_timeline: Option<String>,
    #[serde(default)]
    pub cost_breakdown: Option<String>,
    #[serde(default)]
    pub why_recommended: Option<String>,
}

impl DetailedProgramReport {
    /// Section name and value, in report order.
    pub fn sections(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("location_environment", self.location_environment.as_deref()),
            ("career_outcomes", self.career_outcomes.as_deref()),
            ("program_intensity", self.program_intensity.as_deref()),
            ("unique_features", self.unique_features.as_deref()),
            ("application_timeline", self.application_timeline.as_deref()),
            ("cost_breakdown", self.cost_breakdown.as_deref()),
            ("why_recommended", self.why_recommended.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConciseProgramReport {
    pub program_id: ProgramId,
    #[serde(default)]
    pub key_strength: Option<String>,
    #[serde(default)]
    pub why_recommended: Option<String>,
    #[serde(default)]
    pub quick_facts: Option<String>,
}

impl ConciseProgramReport {
    pub fn fields(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("key_strength", self.key_strength.as_deref()),
            ("why_recommended", self.why_recommended.as_deref()),
            ("quick_facts", self.quick_facts.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidateReportRequest {
    /// Token from score_and_rank
    pub ranking_token: String,
    /// One entry per detailed-tier program
    #[serde(default)]
    pub detailed_programs: Vec<DetailedProgramReport>,
    /// One entry per concise-tier program
    #[serde(default)]
    pub concise_programs: Vec<ConciseProgramReport>,
    /// Overall application plan across the recommended programs
    #[serde(default)]
    pub application_strategy: Option<String>,
    /// Consultation API key for usage metering
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}
