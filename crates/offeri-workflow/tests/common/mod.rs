#![allow(dead_code)]

use async_trait::async_trait;
use offeri_core::{CountryCount, Program, ProgramId, ProgramSummary};
use offeri_workflow::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const BACKGROUND: &str =
    "BSc Computer Science, GPA 3.7, two machine learning internships, aiming for applied research roles";

pub const CLASSIFICATIONS: [&str; 2] = ["Computer Science & IT", "Engineering"];

pub const USA: [&str; 8] = [
    "Boston College",
    "Carnegie Mellon University",
    "Georgia Institute of Technology",
    "Massachusetts Institute of Technology",
    "Ohio State University",
    "Rice University",
    "Stanford University",
    "University of Washington",
];

pub const GERMANY: [&str; 2] = ["RWTH Aachen University", "Technical University of Munich"];

/// In-memory catalog: six programs per university, five of which match `CLASSIFICATIONS`.
pub struct StaticCatalog {
    programs: Vec<Program>,
}

impl StaticCatalog {
    pub fn sample() -> Self {
        let templates: [(&str, &[&str]); 6] = [
            ("MS Computer Science", &["Computer Science & IT"]),
            ("MS Electrical Engineering", &["Engineering"]),
            ("MBA", &["Business & Management"]),
            ("MS Data Science", &["Data Science & Analytics", "Computer Science & IT"]),
            ("MS Software Engineering", &["Computer Science & IT", "Engineering"]),
            ("MEng Mechanical Engineering", &["Engineering"]),
        ];

        let mut programs = Vec::new();
        let countries = [("USA", &USA[..]), ("Germany", &GERMANY[..])];
        let mut university_index = 0;
        for (country, universities) in countries {
            for university in universities {
                university_index += 1;
                for (offset, (name, classifications)) in templates.iter().enumerate() {
                    programs.push(Program {
                        program_id: university_index * 100 + offset as ProgramId + 1,
                        program_name: name.to_string(),
                        university_name: university.to_string(),
                        country: country.to_string(),
                        city: None,
                        degree_type: Some("Master".to_string()),
                        duration_months: Some(24),
                        is_part_time: false,
                        classifications: classifications.iter().map(|c| c.to_string()).collect(),
                    });
                }
            }
        }
        Self { programs }
    }

    pub fn without(mut self, id: ProgramId) -> Self {
        self.programs.retain(|p| p.program_id != id);
        self
    }
}

#[async_trait]
impl ProgramCatalog for StaticCatalog {
    async fn available_countries(&self) -> Result<Vec<CountryCount>> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for program in &self.programs {
            *counts.entry(program.country.clone()).or_default() += 1;
        }
        let mut countries: Vec<CountryCount> = counts
            .into_iter()
            .map(|(country, program_count)| CountryCount {
                country,
                program_count,
            })
            .collect();
        countries.sort_by(|a, b| b.program_count.cmp(&a.program_count));
        Ok(countries)
    }

    async fn lookup_universities(&self, country: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .programs
            .iter()
            .filter(|p| p.country == country)
            .map(|p| p.university_name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn lookup_programs(
        &self,
        university: &str,
        classifications: &[String],
    ) -> Result<Vec<ProgramSummary>> {
        Ok(self
            .programs
            .iter()
            .filter(|p| p.university_name == university)
            .filter(|p| {
                classifications.is_empty()
                    || p.classifications.iter().any(|c| classifications.contains(c))
            })
            .map(ProgramSummary::from)
            .collect())
    }

    async fn lookup_program_details(&self, ids: &[ProgramId]) -> Result<Vec<Program>> {
        Ok(self
            .programs
            .iter()
            .filter(|p| ids.contains(&p.program_id))
            .cloned()
            .collect())
    }
}

/// Denies one specific key, allows everything else.
pub struct DenyKeyQuota(pub &'static str);

#[async_trait]
impl QuotaGate for DenyKeyQuota {
    async fn check_and_increment(&self, api_key: Option<&str>) -> Result<QuotaDecision> {
        if api_key == Some(self.0) {
            Ok(QuotaDecision::Deny {
                reason: "monthly consultation limit reached (10/10)".to_string(),
            })
        } else {
            Ok(QuotaDecision::Allow)
        }
    }
}

pub struct ChannelMeter(pub mpsc::UnboundedSender<CompletionSummary>);

#[async_trait]
impl UsageMeter for ChannelMeter {
    async fn record_completion(&self, summary: CompletionSummary) -> Result<()> {
        let _ = self.0.send(summary);
        Ok(())
    }
}

/// A meter whose backing store is down.
pub struct FailingMeter;

#[async_trait]
impl UsageMeter for FailingMeter {
    async fn record_completion(&self, _summary: CompletionSummary) -> Result<()> {
        Err(WorkflowError::upstream("usage store", "connection refused"))
    }
}

pub fn engine() -> WorkflowEngine {
    WorkflowEngine::builder()
        .catalog(Arc::new(StaticCatalog::sample()))
        .build()
        .expect("engine")
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Prose of exactly `len` characters.
pub fn text(len: usize) -> String {
    "The program offers strong industry links and a rigorous core. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

pub fn performed_search(query: &str, num_results: Option<u32>, section: Option<&str>) -> ResearchSearch {
    ResearchSearch {
        query: query.to_string(),
        num_results,
        findings: Some(text(140)),
        section: section.map(str::to_string),
        ..Default::default()
    }
}

pub async fn select(engine: &WorkflowEngine, country: &str, universities: &[&str]) -> String {
    let request = SelectUniversitiesRequest {
        background: BACKGROUND.to_string(),
        country: country.to_string(),
        strategy: "conservative".to_string(),
        selected_universities: Some(names(universities)),
        ..Default::default()
    };
    match engine.select_universities(request, None).await.expect("selection") {
        SelectUniversitiesResponse::Confirmed(confirmed) => confirmed.selection_token,
        other => panic!("expected confirmation, got {other:?}"),
    }
}

pub async fn classify(engine: &WorkflowEngine, selection_token: &str) -> String {
    let request = SelectClassificationsRequest {
        selection_token: selection_token.to_string(),
        selected_classifications: Some(names(&CLASSIFICATIONS)),
    };
    match engine.select_classifications(request).await.expect("classification") {
        SelectClassificationsResponse::Confirmed(confirmed) => confirmed.classification_token,
        other => panic!("expected confirmation, got {other:?}"),
    }
}

/// Reviews and confirms one batch, keeping every retrieved program.
pub async fn filter_batch(
    engine: &WorkflowEngine,
    classification_token: Option<&str>,
    previous_batch_token: Option<&str>,
    universities: &[&str],
) -> Result<BatchAccepted> {
    let base = FilterProgramsRequest {
        classification_token: classification_token.map(str::to_string),
        previous_batch_token: previous_batch_token.map(str::to_string),
        universities: names(universities),
        ..Default::default()
    };

    let review = match engine.filter_programs(base.clone()).await? {
        FilterProgramsResponse::Review(review) => review,
        other => panic!("expected review, got {other:?}"),
    };
    let shortlists = review
        .batch
        .iter()
        .map(|u| {
            (
                u.university.clone(),
                u.programs.iter().map(|p| p.program_id).collect(),
            )
        })
        .collect();

    let confirm = FilterProgramsRequest {
        shortlists: Some(shortlists),
        ..base
    };
    match engine.filter_programs(confirm).await? {
        FilterProgramsResponse::Accepted(accepted) => Ok(accepted),
        other => panic!("expected acceptance, got {other:?}"),
    }
}

/// Runs filtering to completion in batches of three.
pub async fn filter_all(engine: &WorkflowEngine, classification_token: &str, universities: &[&str]) -> String {
    let mut previous: Option<String> = None;
    for chunk in universities.chunks(3) {
        let accepted = match &previous {
            None => filter_batch(engine, Some(classification_token), None, chunk).await,
            Some(token) => filter_batch(engine, None, Some(token), chunk).await,
        }
        .expect("batch");
        previous = Some(accepted.batch_token);
    }
    previous.expect("at least one batch")
}

pub async fn analyze_university(
    engine: &WorkflowEngine,
    batch_token: Option<&str>,
    previous_analysis_token: Option<&str>,
    university: &str,
    program_ids: &[ProgramId],
) -> Result<AnalysisAccepted> {
    let request = AnalyzeProgramsRequest {
        batch_token: batch_token.map(str::to_string),
        previous_analysis_token: previous_analysis_token.map(str::to_string),
        university: university.to_string(),
        shortlist: program_ids
            .iter()
            .map(|id| ShortlistInput {
                program_id: *id,
                fit_note: format!("Program {id} covers the applied ML coursework the student wants"),
            })
            .collect(),
        research_searches: vec![],
    };
    engine.analyze_programs(request).await
}

/// The five matching program ids of the `index`-th (1-based) university in fixture order.
pub fn matching_ids(index: ProgramId) -> Vec<ProgramId> {
    [1, 2, 4, 5, 6].iter().map(|j| index * 100 + j).collect()
}

/// Fixture index of a university (USA first, then Germany).
pub fn fixture_index(university: &str) -> ProgramId {
    USA.iter()
        .chain(GERMANY.iter())
        .position(|u| *u == university)
        .map(|p| p as ProgramId + 1)
        .expect("fixture university")
}

/// Analyses every university, shortlisting all of its matching programs.
pub async fn analyze_all(
    engine: &WorkflowEngine,
    batch_token: &str,
    universities: &[&str],
) -> (String, Vec<ProgramId>) {
    let mut previous: Option<String> = None;
    let mut shortlisted = Vec::new();
    for university in universities {
        let ids = matching_ids(fixture_index(university));
        let accepted = match &previous {
            None => analyze_university(engine, Some(batch_token), None, university, &ids).await,
            Some(token) => analyze_university(engine, None, Some(token), university, &ids).await,
        }
        .expect("analysis");
        shortlisted.extend(ids);
        previous = Some(accepted.analysis_token);
    }
    (previous.expect("at least one university"), shortlisted)
}
