// ABOUTME: MCP server exposing the seven consultation steps plus read-only catalog helpers
// ABOUTME: Each tool forwards to the shared WorkflowEngine and maps workflow errors to MCP errors

use offeri_core::ProgramId;
use offeri_workflow::{
    debug_log, AnalyzeProgramsRequest, DebugLogger, FilterProgramsRequest,
    FinalizeSelectionRequest, ScoreAndRankRequest, SelectClassificationsRequest,
    SelectUniversitiesRequest, TokenStore, ValidateReportRequest, WorkflowEngine,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, GetPromptRequestParam, GetPromptResult, ListPromptsResult,
        PaginatedRequestParam, Prompt, PromptMessage, PromptMessageContent, PromptMessageRole,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::to_mcp_error;
use crate::prompts::{WORKFLOW_GUIDE, WORKFLOW_GUIDE_PROMPT_NAME};

const MAX_DETAIL_IDS: usize = 50;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProgramDetailsRequest {
    /// Program ids to look up (1-50)
    pub program_ids: Vec<ProgramId>,
}

#[derive(Clone)]
pub struct OfferiMcpServer {
    engine: Arc<WorkflowEngine>,
    /// Used when a tool call does not carry its own api_key.
    default_api_key: Option<String>,
    tool_router: ToolRouter<Self>,
}

fn log_start<T: Serialize>(step: &str, request: &T) {
    info!("{}: called", step);
    if DebugLogger::is_enabled() {
        if let Ok(arguments) = serde_json::to_value(request) {
            debug_log!(step_start, step, &arguments);
        }
    }
}

fn finish<T: Serialize>(
    step: &str,
    outcome: offeri_workflow::Result<T>,
) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(response) => {
            let value = serde_json::to_value(&response).map_err(|e| {
                McpError::internal_error(format!("Failed to serialize {} response: {}", step, e), None)
            })?;
            debug_log!(step_finish, step, &value);
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(e) => {
            warn!("{} rejected: {}", step, e);
            debug_log!(step_rejected, step, &e.to_string());
            Err(to_mcp_error(e))
        }
    }
}

#[tool_router]
impl OfferiMcpServer {
    pub fn new(engine: Arc<WorkflowEngine>, default_api_key: Option<String>) -> Self {
        Self {
            engine,
            default_api_key,
            tool_router: Self::tool_router(),
        }
    }

    pub fn engine(&self) -> &Arc<WorkflowEngine> {
        &self.engine
    }

    fn api_key(&self, supplied: &Option<String>) -> Option<String> {
        supplied.clone().or_else(|| self.default_api_key.clone())
    }

    #[tool(
        description = "Read the consultation workflow guide: the seven steps, their tokens, and the research each one requires. Call this first if you have not run a consultation before."
    )]
    pub async fn get_workflow_guide(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(WORKFLOW_GUIDE)]))
    }

    #[tool(
        description = "List the countries in the program catalog with their program counts. Country names must be passed to select_universities exactly as listed."
    )]
    pub async fn get_available_countries(&self) -> Result<CallToolResult, McpError> {
        let countries = self
            .engine
            .catalog()
            .available_countries()
            .await
            .map_err(to_mcp_error)?;
        let total_programs: u64 = countries.iter().map(|c| c.program_count).sum();
        let response = json!({
            "countries": countries,
            "country_count": countries.len(),
            "total_programs": total_programs,
        });
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string()),
        )]))
    }

    #[tool(
        description = "Fetch full records (university, country, city, degree type, duration in months, part-time flag, fields of study) for up to 50 program ids. Unknown ids are reported under missing_ids."
    )]
    pub async fn get_program_details(
        &self,
        Parameters(request): Parameters<ProgramDetailsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let count = request.program_ids.len();
        if count == 0 || count > MAX_DETAIL_IDS {
            return Err(McpError::invalid_params(
                format!("program_ids must contain 1-{} ids", MAX_DETAIL_IDS),
                Some(json!({ "expected": format!("1-{}", MAX_DETAIL_IDS), "actual": count })),
            ));
        }

        let programs = self
            .engine
            .catalog()
            .lookup_program_details(&request.program_ids)
            .await
            .map_err(to_mcp_error)?;
        let missing_ids: Vec<ProgramId> = request
            .program_ids
            .iter()
            .copied()
            .filter(|id| !programs.iter().any(|p| p.program_id == *id))
            .collect();
        debug!(
            "get_program_details: {} found, {} missing",
            programs.len(),
            missing_ids.len()
        );

        let response = json!({
            "programs": programs,
            "missing_ids": missing_ids,
        });
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string()),
        )]))
    }

    #[tool(
        description = "Step 1. Without selected_universities: list every university in the country with strategy guidance. With selected_universities (1-14 exact names) and optional research_searches (0-3, 5-10 results each): start the consultation and return a selection_token. Starting counts against the monthly quota. Required: background, country, strategy (conservative|aggressive)."
    )]
    pub async fn select_universities(
        &self,
        Parameters(request): Parameters<SelectUniversitiesRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "select_universities";
        log_start(STEP, &request);
        let api_key = self.api_key(&request.api_key);
        let outcome = self
            .engine
            .select_universities(request, api_key.as_deref())
            .await;
        finish(STEP, outcome)
    }

    #[tool(
        description = "Step 2. With only selection_token: list the 15 fields of study. With selected_classifications (1-5 exact names): return a classification_token."
    )]
    pub async fn select_classifications(
        &self,
        Parameters(request): Parameters<SelectClassificationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "select_classifications";
        log_start(STEP, &request);
        let outcome = self.engine.select_classifications(request).await;
        finish(STEP, outcome)
    }

    #[tool(
        description = "Step 3, repeated. Process 1-3 not-yet-processed universities per call. First batch passes classification_token, later batches pass previous_batch_token. Without shortlists: review the batch's programs. With shortlists (university -> program ids): accept the batch and return a batch_token. Done when is_complete is true."
    )]
    pub async fn filter_programs(
        &self,
        Parameters(request): Parameters<FilterProgramsRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "filter_programs";
        log_start(STEP, &request);
        let outcome = self.engine.filter_programs(request).await;
        finish(STEP, outcome)
    }

    #[tool(
        description = "Step 4, repeated, one university per call. First call passes the completed batch_token, later calls pass previous_analysis_token. Submit a shortlist of candidate program ids, each with a fit_note of at least 40 characters, plus optional research_searches (0-2, 5-25 results each). Done when is_complete is true."
    )]
    pub async fn analyze_programs(
        &self,
        Parameters(request): Parameters<AnalyzeProgramsRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "analyze_programs";
        log_start(STEP, &request);
        let outcome = self.engine.analyze_programs(request).await;
        finish(STEP, outcome)
    }

    #[tool(
        description = "Step 5. Submit final_program_ids drawn from the analysis shortlists with the completed analysis_token. The minimum count is 10, or 20 when 7 or more universities were selected. Returns a final_selection_token and tier guidance."
    )]
    pub async fn finalize_selection(
        &self,
        Parameters(request): Parameters<FinalizeSelectionRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "finalize_selection";
        log_start(STEP, &request);
        let outcome = self.engine.finalize_selection(request).await;
        finish(STEP, outcome)
    }

    #[tool(
        description = "Step 6. Score and rank the final programs. career_clarity (high|medium|low) picks the reputation/fit weighting. Returns a ranking_token with the detailed and concise tiers and the research each detailed program needs."
    )]
    pub async fn score_and_rank(
        &self,
        Parameters(request): Parameters<ScoreAndRankRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "score_and_rank";
        log_start(STEP, &request);
        let outcome = self.engine.score_and_rank(request).await;
        finish(STEP, outcome)
    }

    #[tool(
        description = "Step 7. Validate the report content against the ranking_token: for each detailed program exactly 3 searches (curriculum, admissions, outcomes; 15 results each) with findings and 7 analysis sections; for each concise program 3 summary fields; plus application_strategy. Returns the report outline on success."
    )]
    pub async fn validate_report(
        &self,
        Parameters(request): Parameters<ValidateReportRequest>,
    ) -> Result<CallToolResult, McpError> {
        const STEP: &str = "validate_report";
        log_start(STEP, &request);
        let api_key = self.api_key(&request.api_key);
        let outcome = self
            .engine
            .validate_report(request, api_key.as_deref())
            .await;
        DebugLogger::flush();
        finish(STEP, outcome)
    }
}

/// Periodically drops expired continuation tokens. Only useful when the store has a TTL.
pub fn spawn_token_janitor(store: Arc<dyn TokenStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                info!("Purged {} expired tokens ({} live)", removed, store.len());
            }
        }
    })
}

#[tool_handler]
impl ServerHandler for OfferiMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(WORKFLOW_GUIDE.into()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            ..Default::default()
        }
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListPromptsResult {
                prompts: vec![Prompt {
                    name: WORKFLOW_GUIDE_PROMPT_NAME.to_string(),
                    title: Some("OfferI consultation workflow".to_string()),
                    description: Some(
                        "The seven-step consultation chain, its tokens and the research each step requires."
                            .to_string(),
                    ),
                    arguments: None,
                    icons: None,
                }],
                next_cursor: None,
            })
        }
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        let name = request.name.clone();
        async move {
            if name != WORKFLOW_GUIDE_PROMPT_NAME {
                return Err(McpError::invalid_params(
                    format!("Unknown prompt: {}", name),
                    None,
                ));
            }
            Ok(GetPromptResult {
                description: Some("OfferI consultation workflow guide".to_string()),
                messages: vec![
                    PromptMessage {
                        role: PromptMessageRole::User,
                        content: PromptMessageContent::text(
                            "Read the consultation workflow below before calling any OfferI step tool.",
                        ),
                    },
                    PromptMessage {
                        role: PromptMessageRole::Assistant,
                        content: PromptMessageContent::text(WORKFLOW_GUIDE),
                    },
                ],
            })
        }
    }
}
