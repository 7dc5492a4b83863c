// crates/ledger-gate-server/tests/http_server.rs
// ============================================================================
// Module: Callable HTTP Server Tests
// Description: End-to-end tests for the axum callable transport.
// Purpose: Validate wire codes, envelopes, body limits, and listings.
// Dependencies: ledger-gate-server, axum, reqwest, tokio
// ============================================================================

//! ## Overview
//! Boots the callable server on an ephemeral port and drives it over HTTP:
//! successful calls return `{"result": ...}`, failures return the error
//! envelope with the stable wire codes, oversized bodies are rejected before
//! parsing, and the callables and health endpoints respond.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::SocketAddr;

use ledger_gate_server::CallServer;
use ledger_gate_server::LedgerGateConfig;
use ledger_gate_server::config::AuditConfig;
use ledger_gate_server::config::AuditSinkType;
use ledger_gate_server::config::ServerAuthConfig;
use ledger_gate_server::config::ServerConfig;
use ledger_gate_server::config::StoreConfig;
use ledger_gate_server::config::TokenEntry;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a server config over an in-memory store with one token.
fn test_config(max_body_bytes: usize) -> LedgerGateConfig {
    LedgerGateConfig {
        server: ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            max_body_bytes,
            auth: Some(ServerAuthConfig {
                tokens: vec![TokenEntry {
                    token: "t-owner".to_string(),
                    principal: "u1".to_string(),
                }],
            }),
        },
        store: StoreConfig::default(),
        audit: AuditConfig {
            sink: AuditSinkType::None,
            path: None,
        },
    }
}

/// Boots the server on an ephemeral port and returns its base URL.
async fn boot(max_body_bytes: usize) -> String {
    let server = CallServer::from_config(test_config(max_body_bytes)).unwrap();
    let app = server.into_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    format!("http://{addr}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies a successful call returns the result envelope.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn successful_call_returns_result_envelope() {
    let base = boot(1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/v1/call/business-create"))
        .bearer_auth("t-owner")
        .json(&json!({ "name": "Acme Studio" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["result"]["id"].as_str().is_some());
}

/// Verifies missing credentials map to the unauthenticated wire code.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_token_maps_to_unauthenticated() {
    let base = boot(1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/v1/call/business-create"))
        .json(&json!({ "name": "Acme Studio" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], json!("unauthenticated"));
}

/// Verifies schema violations carry structured field errors on the wire.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn schema_violation_carries_field_errors() {
    let base = boot(1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/v1/call/business-create"))
        .bearer_auth("t-owner")
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], json!("invalid-argument"));
    assert!(body["error"]["details"]["field_errors"].is_object());
}

/// Verifies unknown callables map to the not-found wire code.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_callable_maps_to_not_found() {
    let base = boot(1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/v1/call/business-rename"))
        .bearer_auth("t-owner")
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], json!("not-found"));
}

/// Verifies oversized bodies are rejected before parsing.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversized_body_is_rejected() {
    let base = boot(64).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/v1/call/business-create"))
        .bearer_auth("t-owner")
        .json(&json!({ "name": "x".repeat(256) }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 413);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], json!("invalid-argument"));
}

/// Verifies the callables listing requires a principal and names endpoints.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callables_listing_requires_principal() {
    let base = boot(1024 * 1024).await;
    let client = reqwest::Client::new();

    let denied = client.get(format!("{base}/v1/callables")).send().await.unwrap();
    assert_eq!(denied.status(), 401);

    let allowed = client
        .get(format!("{base}/v1/callables"))
        .bearer_auth("t-owner")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    let body: Value = allowed.json().await.unwrap();
    let names: Vec<&str> = body["callables"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|entry| entry["name"].as_str())
        .collect();
    assert!(names.contains(&"invoice-upsert"));
}

/// Verifies the health endpoint reports store readiness.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_reports_ok() {
    let base = boot(1024 * 1024).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/v1/health")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("ok"));
}
