use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Catalog identifier of a degree program.
pub type ProgramId = i64;

/// Full catalog record of a degree program.
///
/// Programs are read-only reference data; the workflow fetches them by id
/// or filter and never creates or mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Program {
    pub program_id: ProgramId,
    pub program_name: String,
    pub university_name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
    #[serde(default)]
    pub is_part_time: bool,
    #[serde(default)]
    pub classifications: Vec<String>,
}

impl Program {
    /// `study_mode` values such as "Part-time" or "part time online" mark a part-time program.
    pub fn part_time_from_study_mode(study_mode: Option<&str>) -> bool {
        study_mode
            .map(|mode| mode.to_lowercase().contains("part"))
            .unwrap_or(false)
    }
}

/// Compact listing row returned while screening a university's programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgramSummary {
    pub program_id: ProgramId,
    pub program_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,
}

impl From<&Program> for ProgramSummary {
    fn from(program: &Program) -> Self {
        Self {
            program_id: program.program_id,
            program_name: program.program_name.clone(),
            degree_type: program.degree_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CountryCount {
    pub country: String,
    pub program_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeTypeCount {
    pub degree_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversityCount {
    pub university: String,
    pub country: String,
    pub programs: u64,
}

/// Aggregate numbers describing what the catalog holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_programs: u64,
    pub with_duration: u64,
    pub with_degree_type: u64,
    pub top_countries: Vec<CountryCount>,
    pub top_universities: Vec<UniversityCount>,
    pub degree_types: Vec<DegreeTypeCount>,
}
