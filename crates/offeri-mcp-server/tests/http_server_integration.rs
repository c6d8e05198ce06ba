// ABOUTME: Integration tests for the HTTP MCP endpoints
// ABOUTME: Health check and MCP initialize over the streamable HTTP service

#![cfg(feature = "server-http")]

mod common;

use http_body_util::BodyExt;
use offeri_mcp_server::{build_http_app, HttpServerConfig};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn health_check_answers_ok() {
    let app = build_http_app(common::server(), &HttpServerConfig::default());
    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("GET")
                .uri("/health")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("health response");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert_eq!(std::str::from_utf8(&body).expect("utf8"), "OK");
}

#[tokio::test]
async fn initialize_opens_a_session() {
    let config = HttpServerConfig {
        keep_alive_seconds: 5,
        ..HttpServerConfig::default()
    };
    let app = build_http_app(common::server(), &config);

    let initialize_request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    });

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("Accept", "application/json, text/event-stream")
                .header("Content-Type", "application/json")
                .body(axum::body::Body::from(initialize_request.to_string()))
                .expect("request"),
        )
        .await
        .expect("initialize response");

    let status = response.status();
    assert!(status.is_success(), "initialize failed with {}", status);
    assert!(
        response.headers().contains_key("mcp-session-id"),
        "stateful mode should hand out a session id"
    );

    let body = tokio::time::timeout(Duration::from_secs(5), response.into_body().collect())
        .await
        .expect("initialize stream closes")
        .expect("body")
        .to_bytes();
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("OfferI Consultation Workflow"));
}
