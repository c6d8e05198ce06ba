// ABOUTME: MCP surface of the OfferI consultation workflow
// ABOUTME: Tool router, workflow guide prompt and optional streamable HTTP transport

pub mod bootstrap;
pub mod error;
pub mod official_server;
pub mod prompts;

#[cfg(feature = "server-http")]
pub mod http_config;
#[cfg(feature = "server-http")]
pub mod http_server;

pub use bootstrap::build_server;
pub use error::{to_mcp_error, McpServerError};
pub use official_server::{spawn_token_janitor, OfferiMcpServer};
pub use prompts::{WORKFLOW_GUIDE, WORKFLOW_GUIDE_PROMPT_NAME};

#[cfg(feature = "server-http")]
pub use http_config::HttpServerConfig;
#[cfg(feature = "server-http")]
pub use http_server::{build_http_app, start_http_server};
