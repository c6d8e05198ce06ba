// ABOUTME: Workflow engine driving the seven consultation steps through the token store
// ABOUTME: Each step fetches its predecessor's payload, validates, consults collaborators and mints the next token

use chrono::Utc;
use offeri_core::{classification_names, ProgramId, ProgramSummary, WorkflowConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collaborators::{
    CompletionSummary, NoopUsageMeter, ProgramCatalog, QuotaDecision, QuotaGate, UnmeteredQuota,
    UsageMeter,
};
use crate::debug_log;
use crate::error::{Result, WorkflowError};
use crate::payload::{
    AnalysisPayload, ClassificationPayload, ConsultationContext, FinalSelectionPayload,
    ProgramBatchPayload, RankingPayload, SelectionPayload, StepData, UniversityAnalysis,
};
use crate::policy::{CareerClarity, ReportScale, ResearchSection, Strategy};
use crate::requests::{
    AnalyzeProgramsRequest, FilterProgramsRequest, FinalizeSelectionRequest, ScoreAndRankRequest,
    SelectClassificationsRequest, SelectUniversitiesRequest, ValidateReportRequest,
};
use crate::research::validate_searches;
use crate::responses::{
    AnalysisAccepted, BatchAccepted, BatchReview, ClassificationConfirmed, ClassificationListing,
    FilterProgramsResponse, FinalSelectionAccepted, RankingIssued, ReportAccepted,
    SelectClassificationsResponse, SelectUniversitiesResponse, SelectionConfirmed,
    UniverseListing, UniversityPrograms,
};
use crate::scoring::{rank_programs, KeywordReputation, ReputationLookup};
use crate::token_store::{fetch, mint, InMemoryTokenStore, TokenStore};
use crate::validators::analysis::validate_analysis;
use crate::validators::classification::validate_classifications;
use crate::validators::final_selection::validate_final_selection;
use crate::validators::program_filter::{
    validate_batch, validate_shortlists, validate_target_list,
};
use crate::validators::selection::{
    selection_search_policy, validate_profile, validate_university_choice,
};
use crate::validators::{exactly_one_token, report, ChainToken};
use crate::violation::{one_of, Violations};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Workflow engine build failed: {0}")]
    MissingComponent(&'static str),
}

/// Token-gated consultation state machine. Cheap to share behind an `Arc`;
/// all mutable state lives in the token store.
pub struct WorkflowEngine {
    store: Arc<dyn TokenStore>,
    catalog: Arc<dyn ProgramCatalog>,
    quota: Arc<dyn QuotaGate>,
    usage: Arc<dyn UsageMeter>,
    reputation: Arc<dyn ReputationLookup>,
    config: WorkflowConfig,
}

/// Filtering state carried between `filter_programs` batches.
struct BatchState {
    context: ConsultationContext,
    classifications: Vec<String>,
    target: Vec<String>,
    accumulated: BTreeMap<String, Vec<ProgramId>>,
}

/// Analysis state carried between `analyze_programs` calls.
struct AnalysisState {
    context: ConsultationContext,
    targets: Vec<String>,
    candidates: BTreeMap<String, Vec<ProgramId>>,
    accumulated: BTreeMap<String, UniversityAnalysis>,
}

impl WorkflowEngine {
    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder::new()
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    pub fn catalog(&self) -> Arc<dyn ProgramCatalog> {
        Arc::clone(&self.catalog)
    }

    fn mint<T: StepData>(&self, step: &str, data: T) -> String {
        let token = mint(self.store.as_ref(), data);
        info!("{}: issued {}", step, token);
        debug_log!(token, step, &token);
        token
    }

    /// Step 1. Lists the country's universities, or confirms a subset and starts the consultation.
    pub async fn select_universities(
        &self,
        request: SelectUniversitiesRequest,
        api_key: Option<&str>,
    ) -> Result<SelectUniversitiesResponse> {
        let config = &self.config;
        let mut violations = Violations::new();

        let strategy = validate_profile(
            &request.background,
            &request.strategy,
            config,
            &mut violations,
        );

        let universe = self.catalog.lookup_universities(&request.country).await?;
        if universe.is_empty() {
            let countries = self.catalog.available_countries().await?;
            violations.push_detail(
                "country",
                format!("no programs found for \"{}\"", request.country),
                one_of(countries.iter().map(|c| c.country.as_str())),
                format!("\"{}\"", request.country),
            );
        }

        let research = validate_searches(
            "research_searches",
            &request.research_searches,
            &selection_search_policy(config),
            &mut violations,
        );

        if let Some(selected) = &request.selected_universities {
            if !universe.is_empty() {
                validate_university_choice(selected, &universe, config, &mut violations);
            }
        }

        let strategy = violations
            .into_result(strategy)?
            .ok_or_else(|| WorkflowError::violation("strategy", "unknown strategy"))?;

        let Some(selected) = request.selected_universities else {
            debug!(
                "select_universities: listed {} universities for {}",
                universe.len(),
                request.country
            );
            return Ok(SelectUniversitiesResponse::Universe(UniverseListing {
                university_count: universe.len(),
                guidance: selection_guidance(strategy, config),
                country: request.country,
                universities: universe,
                strategy: strategy.as_str().to_string(),
                strategy_ratios: strategy.ratios(),
                max_selectable: config.max_selected_universities,
                next_step: "Call select_universities again with selected_universities \
                            (exact names from this list) to confirm the choice"
                    .to_string(),
            }));
        };

        match self.quota.check_and_increment(api_key).await? {
            QuotaDecision::Allow => {}
            QuotaDecision::Deny { reason } => {
                warn!("select_universities: quota denied: {}", reason);
                return Err(WorkflowError::QuotaDenied { reason });
            }
        }

        let research_recorded = research.len();
        let context = ConsultationContext {
            background: request.background.trim().to_string(),
            country: request.country.clone(),
            strategy,
            universities: selected.clone(),
        };
        let token = self.mint("select_universities", SelectionPayload { context, research });

        Ok(SelectUniversitiesResponse::Confirmed(SelectionConfirmed {
            selection_token: token,
            country: request.country,
            selected_universities: selected,
            strategy: strategy.as_str().to_string(),
            strategy_ratios: strategy.ratios(),
            research_recorded,
            next_step: "Call select_classifications with this selection_token".to_string(),
        }))
    }

    /// Step 2. Lists the taxonomy, or confirms the chosen classifications.
    pub async fn select_classifications(
        &self,
        request: SelectClassificationsRequest,
    ) -> Result<SelectClassificationsResponse> {
        let selection: SelectionPayload = fetch(self.store.as_ref(), &request.selection_token)?;

        let Some(chosen) = request.selected_classifications else {
            return Ok(SelectClassificationsResponse::Listing(ClassificationListing {
                classifications: classification_names(),
                max_selectable: self.config.max_classifications,
                next_step: "Call select_classifications again with selected_classifications \
                            (1-5 exact names)"
                    .to_string(),
            }));
        };

        let classifications = validate_classifications(&chosen, &self.config)?;
        let universities = selection.context.universities.clone();
        let token = self.mint(
            "select_classifications",
            ClassificationPayload {
                context: selection.context,
                classifications: classifications.clone(),
            },
        );

        Ok(SelectClassificationsResponse::Confirmed(ClassificationConfirmed {
            classification_token: token,
            selected_classifications: classifications,
            next_step: format!(
                "Call filter_programs with this classification_token and the first batch \
                 of up to {} universities",
                self.config.max_universities_per_batch
            ),
            universities,
        }))
    }

    /// Step 3. Retrieves a batch's programs, or accepts the batch's name shortlists.
    pub async fn filter_programs(
        &self,
        request: FilterProgramsRequest,
    ) -> Result<FilterProgramsResponse> {
        let mut violations = Violations::new();

        let chain = exactly_one_token(
            "classification_token",
            request.classification_token.as_deref(),
            "previous_batch_token",
            request.previous_batch_token.as_deref(),
            &mut violations,
        );

        let state = match chain {
            None => return Err(WorkflowError::ContractViolation(violations)),
            Some(ChainToken::First(token)) => {
                let classification: ClassificationPayload = fetch(self.store.as_ref(), token)?;
                BatchState {
                    target: classification.context.universities.clone(),
                    context: classification.context,
                    classifications: classification.classifications,
                    accumulated: BTreeMap::new(),
                }
            }
            Some(ChainToken::Second(token)) => {
                let previous: ProgramBatchPayload = fetch(self.store.as_ref(), token)?;
                if previous.is_complete() {
                    violations.push(
                        "previous_batch_token",
                        "every target university has been processed; continue with analyze_programs",
                    );
                }
                BatchState {
                    context: previous.context,
                    classifications: previous.classifications,
                    target: previous.target_universities,
                    accumulated: previous.accumulated,
                }
            }
        };

        if let Some(given) = &request.all_selected_universities {
            validate_target_list(given, &state.target, &mut violations);
        }
        validate_batch(
            &request.universities,
            &state.target,
            &state.accumulated,
            &self.config,
            &mut violations,
        );
        violations.finish()?;

        let mut retrieved = BTreeMap::new();
        for university in &request.universities {
            let programs = self
                .catalog
                .lookup_programs(university, &state.classifications)
                .await?;
            retrieved.insert(university.clone(), programs);
        }

        let remaining_before: Vec<String> = state
            .target
            .iter()
            .filter(|u| !state.accumulated.contains_key(*u))
            .cloned()
            .collect();

        let Some(shortlists) = request.shortlists else {
            let batch = request
                .universities
                .iter()
                .map(|university| {
                    let programs = retrieved.get(university).cloned().unwrap_or_default();
                    UniversityPrograms {
                        university: university.clone(),
                        program_count: programs.len(),
                        programs,
                    }
                })
                .collect();
            return Ok(FilterProgramsResponse::Review(BatchReview {
                batch,
                target_universities: state.target,
                is_complete: remaining_before.is_empty(),
                remaining: remaining_before,
                next_step: "Call filter_programs again for the same universities with \
                            shortlists (university -> program ids) to confirm"
                    .to_string(),
            }));
        };

        let delta = validate_shortlists(&request.universities, &shortlists, &retrieved)?;

        let mut accumulated = state.accumulated;
        for entry in &delta {
            accumulated.insert(entry.university.clone(), entry.program_ids.clone());
        }

        let payload = ProgramBatchPayload {
            context: state.context,
            classifications: state.classifications,
            target_universities: state.target,
            delta: delta.clone(),
            accumulated,
        };
        let remaining = payload.remaining();
        let is_complete = payload.is_complete();
        let processed_count = payload.accumulated.len();
        let has_candidates = payload.has_candidates();
        let token = self.mint("filter_programs", payload);

        let next_step = if is_complete && !has_candidates {
            "Filtering complete but no university has a matching program, so there is \
             nothing to analyse. Go back to select_classifications with the selection_token \
             and choose broader fields, then filter again"
                .to_string()
        } else if is_complete {
            "Filtering complete. Call analyze_programs with this batch_token, one university per call"
                .to_string()
        } else {
            format!(
                "Call filter_programs with previous_batch_token for the next batch: {}",
                remaining.join(", ")
            )
        };

        Ok(FilterProgramsResponse::Accepted(BatchAccepted {
            batch_token: token,
            accepted: delta,
            processed_count,
            remaining,
            is_complete,
            next_step,
        }))
    }

    /// Step 4. Records the deep analysis of one university.
    pub async fn analyze_programs(
        &self,
        request: AnalyzeProgramsRequest,
    ) -> Result<AnalysisAccepted> {
        let mut violations = Violations::new();

        let chain = exactly_one_token(
            "batch_token",
            request.batch_token.as_deref(),
            "previous_analysis_token",
            request.previous_analysis_token.as_deref(),
            &mut violations,
        );

        let state = match chain {
            None => return Err(WorkflowError::ContractViolation(violations)),
            Some(ChainToken::First(token)) => {
                let batch: ProgramBatchPayload = fetch(self.store.as_ref(), token)?;
                if !batch.is_complete() {
                    violations.push_detail(
                        "batch_token",
                        "program filtering is not finished",
                        "every target university processed",
                        format!("remaining: {}", batch.remaining().join(", ")),
                    );
                }
                let candidates: BTreeMap<String, Vec<ProgramId>> = batch
                    .accumulated
                    .into_iter()
                    .filter(|(_, ids)| !ids.is_empty())
                    .collect();
                let targets = batch
                    .target_universities
                    .into_iter()
                    .filter(|u| candidates.contains_key(u))
                    .collect();
                AnalysisState {
                    context: batch.context,
                    targets,
                    candidates,
                    accumulated: BTreeMap::new(),
                }
            }
            Some(ChainToken::Second(token)) => {
                let previous: AnalysisPayload = fetch(self.store.as_ref(), token)?;
                if previous.is_complete() {
                    violations.push(
                        "previous_analysis_token",
                        "every university has been analysed; continue with finalize_selection",
                    );
                }
                AnalysisState {
                    context: previous.context,
                    targets: previous.target_universities,
                    candidates: previous.candidates,
                    accumulated: previous.accumulated,
                }
            }
        };

        let delta = validate_analysis(
            &request,
            &state.targets,
            &state.candidates,
            &state.accumulated,
            &self.config,
            &mut violations,
        );
        violations.finish()?;

        let mut accumulated = state.accumulated;
        accumulated.insert(delta.university.clone(), delta.clone());

        let payload = AnalysisPayload {
            context: state.context,
            target_universities: state.targets,
            candidates: state.candidates,
            delta: delta.clone(),
            accumulated,
        };
        let remaining = payload.remaining();
        let is_complete = payload.is_complete();
        let total_shortlisted = payload.shortlisted_ids().len();
        let analyzed: Vec<String> = payload.accumulated.keys().cloned().collect();
        let minimum = ReportScale::for_universities(
            payload.context.universities.len(),
            &self.config,
        )
        .total();
        let token = self.mint("analyze_programs", payload);

        let next_step = if is_complete {
            format!(
                "Analysis complete. Call finalize_selection with this analysis_token and at \
                 least {} program ids from the shortlists",
                minimum
            )
        } else {
            format!(
                "Call analyze_programs with previous_analysis_token for the next university: {}",
                remaining.join(", ")
            )
        };

        Ok(AnalysisAccepted {
            analysis_token: token,
            university: delta.university,
            shortlisted_program_ids: delta.shortlist.iter().map(|e| e.program_id).collect(),
            analyzed,
            remaining,
            is_complete,
            total_shortlisted,
            next_step,
        })
    }

    /// Step 5. Accepts the merged final program list.
    pub async fn finalize_selection(
        &self,
        request: FinalizeSelectionRequest,
    ) -> Result<FinalSelectionAccepted> {
        let analysis: AnalysisPayload = fetch(self.store.as_ref(), &request.analysis_token)?;
        let mut violations = Violations::new();

        if !analysis.is_complete() {
            violations.push_detail(
                "analysis_token",
                "program analysis is not finished",
                "every candidate university analysed",
                format!("remaining: {}", analysis.remaining().join(", ")),
            );
        }

        let scale = ReportScale::for_universities(analysis.context.universities.len(), &self.config);
        validate_final_selection(
            &request.final_program_ids,
            &analysis.shortlisted_ids(),
            scale.total(),
            &mut violations,
        );
        violations.finish()?;

        let details = self
            .catalog
            .lookup_program_details(&request.final_program_ids)
            .await?;
        let by_id: HashMap<ProgramId, ProgramSummary> = details
            .iter()
            .map(|program| (program.program_id, ProgramSummary::from(program)))
            .collect();
        let programs = request
            .final_program_ids
            .iter()
            .map(|id| {
                by_id.get(id).cloned().ok_or_else(|| {
                    WorkflowError::upstream("program catalog", format!("no record for program {}", id))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let count = request.final_program_ids.len();
        let tier_guidance = analysis.context.strategy.ratios();
        let token = self.mint(
            "finalize_selection",
            FinalSelectionPayload {
                context: analysis.context,
                program_ids: request.final_program_ids,
                count,
                tier_guidance,
            },
        );

        Ok(FinalSelectionAccepted {
            final_selection_token: token,
            count,
            minimum_required: scale.total(),
            programs,
            tier_guidance,
            tier_targets: tier_guidance.apply(count),
            report_scale: scale,
            next_step: "Call score_and_rank with this final_selection_token and career_clarity"
                .to_string(),
        })
    }

    /// Step 6. Scores the final list and splits the top programs into report tiers.
    pub async fn score_and_rank(&self, request: ScoreAndRankRequest) -> Result<RankingIssued> {
        let selection: FinalSelectionPayload =
            fetch(self.store.as_ref(), &request.final_selection_token)?;

        let clarity = CareerClarity::parse(&request.career_clarity).ok_or_else(|| {
            let mut violations = Violations::new();
            violations.push_detail(
                "career_clarity",
                "unknown career clarity",
                one_of(CareerClarity::NAMES),
                format!("\"{}\"", request.career_clarity),
            );
            WorkflowError::ContractViolation(violations)
        })?;

        let programs = self
            .catalog
            .lookup_program_details(&selection.program_ids)
            .await?;
        let missing: Vec<String> = selection
            .program_ids
            .iter()
            .filter(|id| !programs.iter().any(|p| p.program_id == **id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(WorkflowError::upstream(
                "program catalog",
                format!("no record for programs {}", missing.join(", ")),
            ));
        }

        let scale = ReportScale::for_universities(selection.context.universities.len(), &self.config);
        let mut detailed: Vec<_> = rank_programs(&programs, clarity, self.reputation.as_ref())
            .into_iter()
            .take(scale.total())
            .collect();
        let concise = detailed.split_off(scale.detailed.min(detailed.len()));
        let searches = ResearchSection::ALL.len();

        info!(
            "score_and_rank: {} detailed, {} concise ({} clarity)",
            detailed.len(),
            concise.len(),
            clarity.as_str()
        );

        let weights = clarity.weights();
        let token = self.mint(
            "score_and_rank",
            RankingPayload {
                context: selection.context,
                career_clarity: clarity,
                weights,
                report_scale: scale,
                detailed: detailed.clone(),
                concise: concise.clone(),
                searches_per_detailed_program: searches,
            },
        );

        Ok(RankingIssued {
            ranking_token: token,
            career_clarity: clarity.as_str().to_string(),
            weights,
            report_scale: scale,
            detailed_programs: detailed,
            concise_programs: concise,
            searches_per_detailed_program: searches,
            results_per_search: self.config.detailed_results_per_search,
            research_sections: ResearchSection::NAMES.iter().map(|s| s.to_string()).collect(),
            required_sections: [
                "location_environment",
                "career_outcomes",
                "program_intensity",
                "unique_features",
                "application_timeline",
                "cost_breakdown",
                "why_recommended",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            concise_fields: ["key_strength", "why_recommended", "quick_facts"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            next_step: "Research every detailed program, then call validate_report with this \
                        ranking_token"
                .to_string(),
        })
    }

    /// Step 7. Validates the written report. Terminal: no token is issued.
    pub async fn validate_report(
        &self,
        request: ValidateReportRequest,
        api_key: Option<&str>,
    ) -> Result<ReportAccepted> {
        let ranking: RankingPayload = fetch(self.store.as_ref(), &request.ranking_token)?;
        let report_outline = report::validate_report(&request, &ranking, &self.config)?;

        let summary = CompletionSummary {
            api_key: api_key.map(str::to_string),
            country: ranking.context.country.clone(),
            university_count: ranking.context.universities.len(),
            detailed_programs: ranking.detailed.len(),
            concise_programs: ranking.concise.len(),
            completed_at: Utc::now(),
        };
        let usage = Arc::clone(&self.usage);
        tokio::spawn(async move {
            if let Err(e) = usage.record_completion(summary).await {
                warn!("Usage metering failed: {}", e);
            }
        });

        info!("validate_report: consultation complete for {}", ranking.context.country);

        Ok(ReportAccepted {
            status: "validated".to_string(),
            detailed_programs: ranking.detailed.len(),
            concise_programs: ranking.concise.len(),
            report_outline,
            next_step: "Write the final report following the outline".to_string(),
        })
    }
}

fn selection_guidance(strategy: Strategy, config: &WorkflowConfig) -> Vec<String> {
    let ratios = strategy.ratios();
    vec![
        format!(
            "Choose 1-{} universities using the exact names listed",
            config.max_selected_universities
        ),
        format!(
            "{} mix: {}% lottery, {}% reach, {}% target, {}% safety",
            strategy, ratios.lottery, ratios.reach, ratios.target, ratios.safety
        ),
        format!(
            "Selecting {} or more universities doubles the report to {} programs",
            config.large_report_threshold,
            config.large_report_detailed + config.large_report_concise
        ),
    ]
}

pub struct WorkflowEngineBuilder {
    store: Option<Arc<dyn TokenStore>>,
    catalog: Option<Arc<dyn ProgramCatalog>>,
    quota: Option<Arc<dyn QuotaGate>>,
    usage: Option<Arc<dyn UsageMeter>>,
    reputation: Option<Arc<dyn ReputationLookup>>,
    config: WorkflowConfig,
}

impl WorkflowEngineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            catalog: None,
            quota: None,
            usage: None,
            reputation: None,
            config: WorkflowConfig::default(),
        }
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn ProgramCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn quota(mut self, quota: Arc<dyn QuotaGate>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn usage_meter(mut self, usage: Arc<dyn UsageMeter>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn reputation(mut self, reputation: Arc<dyn ReputationLookup>) -> Self {
        self.reputation = Some(reputation);
        self
    }

    pub fn config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> std::result::Result<WorkflowEngine, BuildError> {
        let catalog = self
            .catalog
            .ok_or(BuildError::MissingComponent("program catalog required"))?;

        Ok(WorkflowEngine {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryTokenStore::new())),
            catalog,
            quota: self.quota.unwrap_or_else(|| Arc::new(UnmeteredQuota)),
            usage: self.usage.unwrap_or_else(|| Arc::new(NoopUsageMeter)),
            reputation: self
                .reputation
                .unwrap_or_else(|| Arc::new(KeywordReputation::default())),
            config: self.config,
        })
    }
}

impl Default for WorkflowEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_catalog() {
        let err = WorkflowEngineBuilder::new().build().err().unwrap();
        assert_eq!(
            err.to_string(),
            "Workflow engine build failed: program catalog required"
        );
    }

    struct EmptyCatalog;

    #[async_trait::async_trait]
    impl ProgramCatalog for EmptyCatalog {
        async fn available_countries(&self) -> Result<Vec<offeri_core::CountryCount>> {
            Ok(Vec::new())
        }
        async fn lookup_universities(&self, _country: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn lookup_programs(
            &self,
            _university: &str,
            _classifications: &[String],
        ) -> Result<Vec<offeri_core::ProgramSummary>> {
            Ok(Vec::new())
        }
        async fn lookup_program_details(
            &self,
            _ids: &[offeri_core::ProgramId],
        ) -> Result<Vec<offeri_core::Program>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn empty_catalog_rejects_every_country() {
        let engine = WorkflowEngine::builder()
            .catalog(Arc::new(EmptyCatalog))
            .build()
            .unwrap();
        let request = SelectUniversitiesRequest {
            background: "MSc applicant with a physics degree and lab experience".into(),
            country: "USA".into(),
            strategy: "aggressive".into(),
            ..Default::default()
        };

        let err = tokio_test::block_on(engine.select_universities(request, None)).unwrap_err();
        let violations = err.violations().expect("contract violation");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.iter().next().unwrap().field, "country");
    }

    #[test]
    fn guidance_mentions_strategy_mix() {
        let lines = selection_guidance(Strategy::Aggressive, &WorkflowConfig::default());
        assert!(lines[1].starts_with("aggressive mix: 20% lottery"));
    }
}
