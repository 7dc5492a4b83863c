// crates/ledger-gate-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Document Store Tests
// Description: Tests for the durable SQLite document store.
// Purpose: Validate round-trips, event ordering, persistence, and limits.
// Dependencies: ledger-gate-store-sqlite, ledger-gate-core, tempfile
// ============================================================================

//! ## Overview
//! Exercises the `SQLite` document store against a temporary database file:
//! document round-trips and upserts, store-assigned create ids, append-only
//! event ordering across reopen, size limits, and schema version checks.

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
use ledger_gate_core::PrincipalId;
use ledger_gate_store_sqlite::MAX_DOCUMENT_BYTES;
use ledger_gate_store_sqlite::SqliteDocumentStore;
use ledger_gate_store_sqlite::SqliteStoreConfig;
use serde_json::json;
use tempfile::TempDir;

/// Builds a store config rooted in the given temp directory.
fn store_config(dir: &TempDir) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: dir.path().join("ledger-gate.db"),
        busy_timeout_ms: 1_000,
        journal_mode: ledger_gate_store_sqlite::SqliteStoreMode::Wal,
        sync_mode: ledger_gate_store_sqlite::SqliteSyncMode::Normal,
    }
}

/// Builds a sample audit event for the given caller.
fn sample_event(user: &str) -> AuditEvent {
    AuditEvent::for_call(
        &FunctionName::parse("journal-append").unwrap(),
        PrincipalId::new(user),
        json!({ "id": "biz1", "memo": "coffee" }),
    )
}

/// Verifies saving then loading a document succeeds.
#[test]
fn sqlite_put_and_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDocumentStore::new(store_config(&dir)).unwrap();
    let collection = CollectionName::new("businesses");
    let id = DocumentId::new("biz1");
    let body = json!({ "name": "Acme Studio", "is_active": true });

    store.put(&collection, &id, body.clone()).unwrap();
    assert_eq!(store.get(&collection, &id).unwrap(), Some(body));
}

/// Verifies put replaces an existing body.
#[test]
fn sqlite_put_overwrites_existing_body() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDocumentStore::new(store_config(&dir)).unwrap();
    let collection = CollectionName::new("businesses");
    let id = DocumentId::new("biz1");

    store.put(&collection, &id, json!({ "name": "old" })).unwrap();
    store.put(&collection, &id, json!({ "name": "new" })).unwrap();

    assert_eq!(store.get(&collection, &id).unwrap(), Some(json!({ "name": "new" })));
}

/// Verifies create assigns distinct ids and persists the body.
#[test]
fn sqlite_create_assigns_unique_ids() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDocumentStore::new(store_config(&dir)).unwrap();
    let collection = CollectionName::new("businesses");

    let first = store.create(&collection, json!({ "name": "a" })).unwrap();
    let second = store.create(&collection, json!({ "name": "b" })).unwrap();

    assert_ne!(first, second);
    assert_eq!(store.get(&collection, &second).unwrap(), Some(json!({ "name": "b" })));
}

/// Verifies events persist in append order across a reopen.
#[test]
fn sqlite_events_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    let collection = CollectionName::new("businesses");
    let id = DocumentId::new("biz1");

    {
        let store = SqliteDocumentStore::new(store_config(&dir)).unwrap();
        store.append_event(&collection, &id, &sample_event("u1")).unwrap();
        store.append_event(&collection, &id, &sample_event("u2")).unwrap();
    }

    let reopened = SqliteDocumentStore::new(store_config(&dir)).unwrap();
    let events = reopened.events(&collection, &id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.user_id.as_str(), "u1");
    assert_eq!(events[1].event.user_id.as_str(), "u2");
    assert_ne!(events[0].event_id, events[1].event_id);
    assert_eq!(events[0].event.event_type, "FUNCTION_CALL_JOURNAL_APPEND");
}

/// Verifies oversized documents are rejected with a size error.
#[test]
fn sqlite_rejects_oversized_document() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDocumentStore::new(store_config(&dir)).unwrap();
    let oversized = json!({ "blob": "x".repeat(MAX_DOCUMENT_BYTES + 1) });

    let error = store
        .put(&CollectionName::new("businesses"), &DocumentId::new("biz1"), oversized)
        .unwrap_err();

    assert!(error.to_string().contains("size limit"));
}

/// Verifies readiness succeeds on a healthy store.
#[test]
fn sqlite_readiness_reports_ok() {
    let dir = TempDir::new().unwrap();
    let store = SqliteDocumentStore::new(store_config(&dir)).unwrap();
    store.readiness().unwrap();
}

/// Verifies a future schema version fails closed on open.
#[test]
fn sqlite_rejects_unsupported_schema_version() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir);
    drop(SqliteDocumentStore::new(config.clone()).unwrap());

    let connection = rusqlite::Connection::open(&config.path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    drop(connection);

    let error = SqliteDocumentStore::new(config).unwrap_err();
    assert!(error.to_string().contains("version mismatch"));
}
