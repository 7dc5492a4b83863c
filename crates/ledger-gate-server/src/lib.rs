// crates/ledger-gate-server/src/lib.rs
// ============================================================================
// Module: Ledger Gate Server Library
// Description: Callable HTTP server over the audited gateway pipeline.
// Purpose: Wire config, identity, store, domain callables, and transport.
// Dependencies: axum, ledger-gate-core, ledger-gate-schema, tokio
// ============================================================================

//! ## Overview
//! The Ledger Gate server exposes the business-domain callables over an HTTP
//! transport. Every request is routed through the audited gateway pipeline;
//! the transport only resolves identity, caps body sizes, and maps results
//! onto the stable wire contract.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod callables;
pub mod config;
pub mod domain;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileCallAuditSink;
pub use audit::StderrCallAuditSink;
pub use auth::BearerIdentityProvider;
pub use auth::IdentityProvider;
pub use auth::RequestContext;
pub use callables::CallRouter;
pub use callables::CallableDefinition;
pub use callables::RegisteredCallable;
pub use config::ConfigError;
pub use config::LedgerGateConfig;
pub use domain::register_domain_callables;
pub use server::CallServer;
pub use server::ServerError;
