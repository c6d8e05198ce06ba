use offeri_workflow::WorkflowError;
use rmcp::ErrorData as McpError;
use serde_json::json;
use thiserror::Error;

/// Startup and transport failures of the server process.
#[derive(Error, Debug)]
pub enum McpServerError {
    #[error("Invalid bind address {address}: {source}")]
    BindAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] offeri_catalog::CatalogError),

    #[error("Engine error: {0}")]
    Engine(#[from] offeri_workflow::BuildError),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Maps a workflow failure to the MCP error the caller sees.
///
/// Token and contract problems are `invalid_params` carrying a JSON `data`
/// payload, so the client can fix its submission and retry with the same token.
pub fn to_mcp_error(error: WorkflowError) -> McpError {
    let message = error.to_string();
    match error {
        WorkflowError::InvalidToken { token } => McpError::invalid_params(
            message,
            Some(json!({ "kind": "invalid_token", "token": token })),
        ),
        WorkflowError::WrongStepType {
            token,
            expected,
            actual,
        } => McpError::invalid_params(
            message,
            Some(json!({
                "kind": "wrong_step_type",
                "token": token,
                "expected": expected,
                "actual": actual,
            })),
        ),
        WorkflowError::ContractViolation(violations) => McpError::invalid_params(
            format!("{} contract violation(s); fix all of them and resubmit", violations.len()),
            Some(json!({
                "kind": "contract_violation",
                "violations": violations,
            })),
        ),
        WorkflowError::QuotaDenied { reason } => McpError::invalid_request(
            message,
            Some(json!({ "kind": "quota_denied", "reason": reason })),
        ),
        WorkflowError::UpstreamUnavailable { service, .. } => McpError::internal_error(
            message,
            Some(json!({ "kind": "upstream_unavailable", "service": service })),
        ),
    }
}
