#![cfg(feature = "server-http")]
// ABOUTME: Streamable HTTP transport for the OfferI MCP server via rmcp's StreamableHttpService
// ABOUTME: Mounts the MCP endpoint at /mcp next to a plain /health check

use axum::Router;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::McpServerError;
use crate::http_config::HttpServerConfig;
use crate::official_server::OfferiMcpServer;

/// Router with one stateful MCP session per client. Every session shares the
/// same engine, so tokens minted in one session are visible to the others.
pub fn build_http_app(server: OfferiMcpServer, config: &HttpServerConfig) -> Router {
    let http_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            sse_keep_alive: Some(Duration::from_secs(config.keep_alive_seconds)),
            stateful_mode: true,
            ..Default::default()
        },
    );

    // nest_service lets the MCP service route its own POST/GET/DELETE under /mcp
    Router::new()
        .nest_service("/mcp", http_service)
        .route("/health", axum::routing::get(health_check))
}

pub async fn start_http_server(
    server: OfferiMcpServer,
    config: HttpServerConfig,
) -> Result<(), McpServerError> {
    let address = config.bind_address();
    let addr: SocketAddr = address
        .parse()
        .map_err(|source| McpServerError::BindAddress {
            address: address.clone(),
            source,
        })?;

    let app = build_http_app(server, &config);

    info!("OfferI MCP HTTP server listening on http://{}", addr);
    info!("  POST http://{}/mcp - Initialize session and send MCP requests", addr);
    info!("  GET  http://{}/mcp - Open SSE stream (requires Mcp-Session-Id header)", addr);
    info!("  GET  http://{}/health - Health check", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| McpServerError::Transport(e.to_string()))?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
