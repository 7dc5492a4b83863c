// crates/ledger-gate-core/src/core/mod.rs
// ============================================================================
// Module: Ledger Gate Core Types
// Description: Canonical identifier, document, and audit structures.
// Purpose: Provide stable, serializable types for callable requests and trails.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Ledger Gate core types define the identifiers, document authorization
//! views, and audit trail records shared by every callable endpoint. These
//! types are the canonical source of truth for any derived API surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod document;
pub mod identifiers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditDetails;
pub use audit::AuditEvent;
pub use audit::StoredAuditEvent;
pub use document::AccessGrant;
pub use document::BusinessAccess;
pub use identifiers::CollectionName;
pub use identifiers::DocumentId;
pub use identifiers::EventId;
pub use identifiers::FunctionName;
pub use identifiers::PrincipalId;
pub use identifiers::Role;
