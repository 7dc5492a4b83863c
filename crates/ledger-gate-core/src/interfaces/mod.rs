// crates/ledger-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Ledger Gate Interfaces
// Description: Backend-agnostic interfaces for storage, validation, and audit.
// Purpose: Define the contract surfaces used by the callable gateway runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the gateway integrates with the document store, the
//! payload validator, and the observability audit sink without embedding
//! backend-specific details. Implementations must be deterministic for
//! identical inputs and fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::audit::AuditEvent;
use crate::core::audit::StoredAuditEvent;
use crate::core::identifiers::CollectionName;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::FunctionName;
use crate::core::identifiers::PrincipalId;

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Document store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("document store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("document store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("document store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("document store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("document store error: {0}")]
    Store(String),
}

/// Document-oriented store addressed by `collection/document` paths.
///
/// Supports point reads and writes of JSON document bodies plus append-only
/// event streams under each document. Event ids and timestamps are assigned
/// by the store so concurrent appends never contend.
pub trait DocumentStore {
    /// Loads a document body by collection and id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError>;

    /// Writes a document body, replacing any existing body.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when writing fails.
    fn put(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        body: Value,
    ) -> Result<(), StoreError>;

    /// Creates a document with a store-assigned unique id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when creation fails.
    fn create(&self, collection: &CollectionName, body: Value) -> Result<DocumentId, StoreError>;

    /// Appends an audit event under a document with a store-assigned id and
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append fails.
    fn append_event(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        event: &AuditEvent,
    ) -> Result<StoredAuditEvent, StoreError>;

    /// Returns the events appended under a document in append order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn events(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Vec<StoredAuditEvent>, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Payload Validation
// ============================================================================

/// Structured validation failure keyed by JSON-pointer field path.
///
/// # Invariants
/// - Every listed path carries at least one message.
/// - Paths are ordered for deterministic serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty field-error map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field path.
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    /// Returns true when no errors are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the messages recorded for a field path.
    #[must_use]
    pub fn messages(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Iterates over field paths and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(path, messages)| (path.as_str(), messages.as_slice()))
    }
}

/// Payload carried by a validated callable request.
pub trait CallPayload {
    /// Returns the target business document id when the schema declares one.
    fn business_id(&self) -> Option<&DocumentId>;
}

/// Validates an untrusted payload into a typed callable input.
pub trait PayloadValidator<T>: Send + Sync {
    /// Validates and decodes the raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`FieldErrors`] describing every failed field when the payload
    /// does not satisfy the schema.
    fn validate(&self, payload: &Value) -> Result<T, FieldErrors>;
}

// ============================================================================
// SECTION: Call Audit Sink
// ============================================================================

/// Outcome classification for a callable invocation.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcomeLabel {
    /// Successful invocation.
    Ok,
    /// Failed invocation.
    Error,
}

/// Pipeline stage labels for audit records.
///
/// # Invariants
/// - Variants are stable for audit labeling and match the guard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Principal presence check.
    Authenticate,
    /// Schema validation of the raw payload.
    Validate,
    /// Role lookup against the stored access map.
    Authorize,
    /// Domain handler execution.
    Execute,
    /// Audit event append.
    Audit,
}

impl PipelineStage {
    /// Returns a stable label for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::Validate => "validate",
            Self::Authorize => "authorize",
            Self::Execute => "execute",
            Self::Audit => "audit",
        }
    }
}

/// Audit record for a callable invocation decision.
///
/// # Invariants
/// - `stage`, `error_kind`, and `reason` are `None` for successful calls.
#[derive(Debug, Clone, Serialize)]
pub struct CallAuditRecord {
    /// Callable function name.
    pub function: FunctionName,
    /// Principal id when the caller was authenticated.
    pub principal: Option<PrincipalId>,
    /// Invocation outcome.
    pub outcome: CallOutcomeLabel,
    /// Failing pipeline stage for error outcomes.
    pub stage: Option<PipelineStage>,
    /// Stable error code for error outcomes.
    pub error_kind: Option<&'static str>,
    /// Failure reason for error outcomes.
    pub reason: Option<String>,
}

/// Audit record for a failed audit-trail append.
///
/// # Invariants
/// - Emitted only when the handler succeeded and the trail write failed.
#[derive(Debug, Clone, Serialize)]
pub struct AuditWriteFailure {
    /// Callable function name.
    pub function: FunctionName,
    /// Collection holding the audited entity.
    pub collection: CollectionName,
    /// Audited entity id.
    pub entity_id: DocumentId,
    /// Store failure description.
    pub reason: String,
}

/// Observability sink for gateway decisions and audit-trail failures.
pub trait CallAuditSink: Send + Sync {
    /// Records an invocation decision.
    fn record_call(&self, record: &CallAuditRecord);

    /// Records a non-fatal audit-trail append failure.
    fn record_audit_write_failure(&self, failure: &AuditWriteFailure) {
        let _ = failure;
    }
}

/// No-op audit sink for tests.
///
/// # Invariants
/// - Records are intentionally discarded.
pub struct NoopCallAuditSink;

impl CallAuditSink for NoopCallAuditSink {
    fn record_call(&self, _record: &CallAuditRecord) {}
}
