// crates/ledger-gate-server/src/server.rs
// ============================================================================
// Module: Callable HTTP Server
// Description: HTTP transport exposing registered callables over axum.
// Purpose: Map callable results and errors onto the stable wire contract.
// Dependencies: axum, ledger-gate-core, ledger-gate-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! The callable server exposes every registered endpoint at
//! `POST /v1/call/{name}` with a single JSON payload and a single JSON
//! result. Errors surface as an envelope carrying one of the stable wire
//! codes (`unauthenticated`, `invalid-argument`, `not-found`,
//! `permission-denied`, `internal`); those strings are a client
//! compatibility contract. Security posture: request bodies are untrusted
//! and size-capped before parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use ledger_gate_core::CallAuditSink;
use ledger_gate_core::CallError;
use ledger_gate_core::DocumentStore;
use ledger_gate_core::FieldErrors;
use ledger_gate_core::InMemoryDocumentStore;
use ledger_gate_core::NoopCallAuditSink;
use ledger_gate_core::SharedDocumentStore;
use ledger_gate_store_sqlite::SqliteDocumentStore;
use ledger_gate_store_sqlite::SqliteStoreConfig;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::audit::FileCallAuditSink;
use crate::audit::StderrCallAuditSink;
use crate::auth::BearerIdentityProvider;
use crate::auth::RequestContext;
use crate::callables::CallRouter;
use crate::config::AuditSinkType;
use crate::config::DocumentStoreType;
use crate::config::LedgerGateConfig;
use crate::domain::register_domain_callables;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Callable server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Callable server instance.
pub struct CallServer {
    /// Validated configuration.
    config: LedgerGateConfig,
    /// Registered callable router.
    router: CallRouter,
    /// Shared document store for readiness probes.
    store: SharedDocumentStore,
}

impl CallServer {
    /// Builds a callable server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or initialization fails.
    pub fn from_config(config: LedgerGateConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_document_store(&config)?;
        let audit = build_audit_sink(&config)?;
        let identity = Arc::new(BearerIdentityProvider::from_config(config.server.auth.as_ref()));
        let mut router = CallRouter::new(identity);
        register_domain_callables(&mut router, &store, &audit)
            .map_err(|err| ServerError::Init(err.to_string()))?;
        Ok(Self {
            config,
            router,
            store,
        })
    }

    /// Returns the axum application for this server.
    #[must_use]
    pub fn into_app(self) -> Router {
        let state = Arc::new(ServerState {
            router: self.router,
            store: self.store,
            max_body_bytes: self.config.server.max_body_bytes,
        });
        Router::new()
            .route("/v1/call/{name}", post(handle_call))
            .route("/v1/callables", get(handle_callables))
            .route("/v1/health", get(handle_health))
            .with_state(state)
    }

    /// Serves requests on the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let bind = self.config.server.bind.clone();
        let addr: SocketAddr =
            bind.parse().map_err(|_| ServerError::Config("invalid bind address".to_string()))?;
        let app = self.into_app();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the document store from configuration.
fn build_document_store(config: &LedgerGateConfig) -> Result<SharedDocumentStore, ServerError> {
    let store = match config.store.store_type {
        DocumentStoreType::Memory => SharedDocumentStore::from_store(InMemoryDocumentStore::new()),
        DocumentStoreType::Sqlite => {
            let path = config
                .store
                .path
                .clone()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let sqlite_config = SqliteStoreConfig {
                path,
                busy_timeout_ms: config.store.busy_timeout_ms,
                journal_mode: config.store.journal_mode,
                sync_mode: config.store.sync_mode,
            };
            let store = SqliteDocumentStore::new(sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedDocumentStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the call audit sink from configuration.
fn build_audit_sink(config: &LedgerGateConfig) -> Result<Arc<dyn CallAuditSink>, ServerError> {
    let sink: Arc<dyn CallAuditSink> = match config.audit.sink {
        AuditSinkType::Stderr => Arc::new(StderrCallAuditSink),
        AuditSinkType::File => {
            let path = config
                .audit
                .path
                .as_deref()
                .ok_or_else(|| ServerError::Config("file audit sink requires path".to_string()))?;
            Arc::new(
                FileCallAuditSink::new(path).map_err(|err| ServerError::Init(err.to_string()))?,
            )
        }
        AuditSinkType::None => Arc::new(NoopCallAuditSink),
    };
    Ok(sink)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared handler state.
struct ServerState {
    /// Registered callable router.
    router: CallRouter,
    /// Shared document store for readiness probes.
    store: SharedDocumentStore,
    /// Maximum accepted request body size.
    max_body_bytes: usize,
}

/// Handles one callable invocation.
async fn handle_call(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(name): Path<String>,
    headers: HeaderMap,
    bytes: Bytes,
) -> impl IntoResponse {
    if bytes.len() > state.max_body_bytes {
        let error = CallError::InvalidArgument {
            message: "request body too large".to_string(),
            field_errors: None,
        };
        return error_response(Some(StatusCode::PAYLOAD_TOO_LARGE), &error);
    }
    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(_) => {
            let error = CallError::InvalidArgument {
                message: "request body is not valid json".to_string(),
                field_errors: None,
            };
            return error_response(None, &error);
        }
    };
    let context = request_context(peer, &headers);
    let result = dispatch_blocking(&state, &context, &name, payload);
    match result {
        Ok(response) => (StatusCode::OK, axum::Json(json!({ "result": response }))),
        Err(error) => error_response(None, &error),
    }
}

/// Lists the registered callable definitions.
async fn handle_callables(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let context = request_context(peer, &headers);
    if state.router.resolve_principal(&context).is_none() {
        let error = CallError::Unauthenticated("caller is not authenticated".to_string());
        return error_response(None, &error);
    }
    let definitions = state.router.definitions();
    (StatusCode::OK, axum::Json(json!({ "callables": definitions })))
}

/// Reports store readiness.
async fn handle_health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match state.store.readiness() {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "ok" }))),
        Err(err) => {
            let error = CallError::Internal(err.to_string());
            error_response(Some(StatusCode::SERVICE_UNAVAILABLE), &error)
        }
    }
}

/// Dispatches a call, shifting to a blocking context when available.
fn dispatch_blocking(
    state: &ServerState,
    context: &RequestContext,
    name: &str,
    payload: Value,
) -> Result<Value, CallError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| state.router.dispatch(context, name, payload))
        }
        _ => state.router.dispatch(context, name, payload),
    }
}

/// Builds the request context from transport metadata.
fn request_context(peer: SocketAddr, headers: &HeaderMap) -> RequestContext {
    let auth_header =
        headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
    RequestContext::new(Some(peer.ip()), auth_header)
}

// ============================================================================
// SECTION: Wire Envelope
// ============================================================================

/// Error envelope body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Error payload.
    error: ErrorEnvelope,
}

/// Error payload with the stable wire code.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    /// Stable wire code.
    status: &'static str,
    /// Human-readable message.
    message: String,
    /// Structured detail payload, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ErrorDetails>,
}

/// Structured error details.
#[derive(Debug, Serialize)]
struct ErrorDetails {
    /// Per-field validation messages.
    field_errors: FieldErrors,
}

/// Builds the error envelope for a call error.
fn error_body(error: &CallError) -> ErrorBody {
    ErrorBody {
        error: ErrorEnvelope {
            status: error.wire_code(),
            message: error.to_string(),
            details: error.field_errors().map(|field_errors| ErrorDetails {
                field_errors: field_errors.clone(),
            }),
        },
    }
}

/// Builds the JSON error response for a call error.
fn error_response(
    status_override: Option<StatusCode>,
    error: &CallError,
) -> (StatusCode, axum::Json<Value>) {
    let status = status_override.unwrap_or_else(|| error_status(error));
    let body = serde_json::to_value(error_body(error)).unwrap_or_else(|_| {
        json!({ "error": { "status": "internal", "message": "serialization failed" } })
    });
    (status, axum::Json(body))
}

/// Maps a call error onto its HTTP status.
fn error_status(error: &CallError) -> StatusCode {
    match error {
        CallError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        CallError::InvalidArgument {
            ..
        } => StatusCode::BAD_REQUEST,
        CallError::NotFound(_) => StatusCode::NOT_FOUND,
        CallError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CallError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
