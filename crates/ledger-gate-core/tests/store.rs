// crates/ledger-gate-core/tests/store.rs
// ============================================================================
// Module: In-Memory Document Store Tests
// Description: Tests for the in-memory document store implementation.
// Purpose: Validate document round-trips, id assignment, and event ordering.
// Dependencies: ledger-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Ensures the in-memory store round-trips document bodies, assigns unique
//! ids on create, and appends events in order with store-assigned identity.

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

use ledger_gate_core::AuditEvent;
use ledger_gate_core::CollectionName;
use ledger_gate_core::DocumentId;
use ledger_gate_core::DocumentStore;
use ledger_gate_core::FunctionName;
use ledger_gate_core::InMemoryDocumentStore;
use ledger_gate_core::PrincipalId;
use serde_json::json;

/// Builds a sample audit event for the given caller.
fn sample_event(user: &str) -> AuditEvent {
    AuditEvent::for_call(
        &FunctionName::parse("invoice-upsert").unwrap(),
        PrincipalId::new(user),
        json!({ "id": "biz1" }),
    )
}

/// Verifies saving then loading a document succeeds.
#[test]
fn store_put_and_get_roundtrip() {
    let store = InMemoryDocumentStore::new();
    let collection = CollectionName::new("businesses");
    let id = DocumentId::new("biz1");
    let body = json!({ "name": "Acme Studio", "is_active": true });

    store.put(&collection, &id, body.clone()).unwrap();
    let loaded = store.get(&collection, &id).unwrap();

    assert_eq!(loaded, Some(body));
}

/// Verifies loading a missing document returns None.
#[test]
fn store_returns_none_for_missing_document() {
    let store = InMemoryDocumentStore::new();
    let loaded =
        store.get(&CollectionName::new("businesses"), &DocumentId::new("missing")).unwrap();
    assert!(loaded.is_none());
}

/// Verifies create assigns distinct non-empty document ids.
#[test]
fn store_create_assigns_unique_ids() {
    let store = InMemoryDocumentStore::new();
    let collection = CollectionName::new("businesses");

    let first = store.create(&collection, json!({ "name": "a" })).unwrap();
    let second = store.create(&collection, json!({ "name": "b" })).unwrap();

    assert!(!first.is_empty());
    assert_ne!(first, second);
    assert_eq!(store.get(&collection, &first).unwrap(), Some(json!({ "name": "a" })));
}

/// Verifies events append in order with unique store-assigned ids.
#[test]
fn store_appends_events_in_order() {
    let store = InMemoryDocumentStore::new();
    let collection = CollectionName::new("businesses");
    let id = DocumentId::new("biz1");

    let first = store.append_event(&collection, &id, &sample_event("u1")).unwrap();
    let second = store.append_event(&collection, &id, &sample_event("u2")).unwrap();

    let events = store.events(&collection, &id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, first.event_id);
    assert_eq!(events[1].event_id, second.event_id);
    assert_ne!(first.event_id, second.event_id);
    assert_eq!(events[0].event.event_type, "FUNCTION_CALL_INVOICE_UPSERT");
    assert!(events[0].timestamp_ms > 0);
}

/// Verifies event streams are scoped per document.
#[test]
fn store_scopes_events_per_document() {
    let store = InMemoryDocumentStore::new();
    let collection = CollectionName::new("businesses");

    store.append_event(&collection, &DocumentId::new("biz1"), &sample_event("u1")).unwrap();

    let other = store.events(&collection, &DocumentId::new("biz2")).unwrap();
    assert!(other.is_empty());
}
