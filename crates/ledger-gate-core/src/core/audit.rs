// crates/ledger-gate-core/src/core/audit.rs
// ============================================================================
// Module: Audit Trail Events
// Description: Immutable audit records appended under affected documents.
// Purpose: Capture who called what with which payload for every state change.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! Every successful state-changing call produces exactly one [`AuditEvent`]
//! appended under the entity the handler acted on. Events are immutable after
//! the append; the store assigns the event id and timestamp so concurrent
//! appends never contend. Appends are intentionally not deduplicated: running
//! the same call twice yields two independent events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::EventId;
use crate::core::identifiers::FunctionName;
use crate::core::identifiers::PrincipalId;

// ============================================================================
// SECTION: Event Payloads
// ============================================================================

/// Audit event payload recorded for a successful callable invocation.
///
/// # Invariants
/// - `event_type` is the stable `FUNCTION_CALL_<NAME>` tag for the callable.
/// - `details.input` holds the raw request payload as received on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Stable event type tag derived from the callable name.
    pub event_type: String,
    /// Principal that made the call.
    pub user_id: PrincipalId,
    /// Structured event details.
    pub details: AuditDetails,
}

/// Structured detail payload attached to an audit event.
///
/// # Invariants
/// - `input` is recorded verbatim; redaction is a sink concern, not a store concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetails {
    /// Raw request payload as received by the gateway.
    pub input: Value,
}

impl AuditEvent {
    /// Builds the audit event for a successful callable invocation.
    #[must_use]
    pub fn for_call(function: &FunctionName, user_id: PrincipalId, input: Value) -> Self {
        Self {
            event_type: function.audit_event_type(),
            user_id,
            details: AuditDetails {
                input,
            },
        }
    }
}

/// Persisted audit event with store-assigned identity and timestamp.
///
/// # Invariants
/// - `event_id` is unique within the parent document's event stream.
/// - `timestamp_ms` is assigned by the store at append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuditEvent {
    /// Store-assigned event identifier.
    pub event_id: EventId,
    /// Store-assigned append timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Recorded event payload.
    pub event: AuditEvent,
}
