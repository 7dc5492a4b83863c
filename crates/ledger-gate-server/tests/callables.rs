// crates/ledger-gate-server/tests/callables.rs
// ============================================================================
// Module: Domain Callable Flow Tests
// Description: End-to-end tests for the registered business callables.
// Purpose: Validate role enforcement, handler effects, and audit trails.
// Dependencies: ledger-gate-server, ledger-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Drives the call router with an in-memory store through full domain flows:
//! business creation granting the owner role, invoice and estimate writes,
//! journal and care-log appends, deactivation lockout, role denial, and the
//! audit events each successful call appends under the business document.

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

use std::sync::Arc;

use ledger_gate_core::CallAuditSink;
use ledger_gate_core::CollectionName;
use ledger_gate_core::DocumentId;
use ledger_gate_core::DocumentStore;
use ledger_gate_core::InMemoryDocumentStore;
use ledger_gate_core::NoopCallAuditSink;
use ledger_gate_core::SharedDocumentStore;
use ledger_gate_server::BearerIdentityProvider;
use ledger_gate_server::CallRouter;
use ledger_gate_server::RequestContext;
use ledger_gate_server::config::ServerAuthConfig;
use ledger_gate_server::config::TokenEntry;
use ledger_gate_server::register_domain_callables;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Test harness bundling the router with its backing store.
struct Harness {
    router: CallRouter,
    store: InMemoryDocumentStore,
}

impl Harness {
    /// Builds a router over an in-memory store with three known tokens.
    fn new() -> Self {
        let store = InMemoryDocumentStore::new();
        let shared = SharedDocumentStore::from_store(store.clone());
        let audit: Arc<dyn CallAuditSink> = Arc::new(NoopCallAuditSink);
        let identity = Arc::new(BearerIdentityProvider::from_config(Some(&ServerAuthConfig {
            tokens: vec![
                token("t-owner", "u1"),
                token("t-admin", "u2"),
                token("t-staff", "u3"),
                token("t-guest", "u4"),
            ],
        })));
        let mut router = CallRouter::new(identity);
        register_domain_callables(&mut router, &shared, &audit).unwrap();
        Self {
            router,
            store,
        }
    }

    /// Dispatches a call authenticated with the given token.
    fn call(&self, token: &str, name: &str, payload: Value) -> Result<Value, String> {
        let context =
            RequestContext::new(None, Some(format!("Bearer {token}")));
        self.router
            .dispatch(&context, name, payload)
            .map_err(|err| err.wire_code().to_string())
    }

    /// Dispatches an unauthenticated call.
    fn call_anonymous(&self, name: &str, payload: Value) -> Result<Value, String> {
        let context = RequestContext::default();
        self.router
            .dispatch(&context, name, payload)
            .map_err(|err| err.wire_code().to_string())
    }

    /// Creates a business as the owner token and returns its id.
    fn create_business(&self) -> String {
        let response =
            self.call("t-owner", "business-create", json!({ "name": "Acme Studio" })).unwrap();
        response["id"].as_str().unwrap().to_string()
    }

    /// Grants a role to a principal directly in the stored document.
    fn grant_role(&self, business_id: &str, principal: &str, role: &str) {
        let collection = CollectionName::new("businesses");
        let id = DocumentId::new(business_id);
        let mut body = self.store.get(&collection, &id).unwrap().unwrap();
        body["access"][principal] = json!({ "role": role });
        self.store.put(&collection, &id, body).unwrap();
    }

    /// Returns the audit event types appended under a business.
    fn event_types(&self, business_id: &str) -> Vec<String> {
        self.store
            .events(&CollectionName::new("businesses"), &DocumentId::new(business_id))
            .unwrap()
            .into_iter()
            .map(|event| event.event.event_type)
            .collect()
    }
}

/// Builds a token entry.
fn token(token: &str, principal: &str) -> TokenEntry {
    TokenEntry {
        token: token.to_string(),
        principal: principal.to_string(),
    }
}

/// Returns a valid invoice payload targeting the business.
fn invoice_payload(business_id: &str) -> Value {
    json!({
        "id": business_id,
        "invoice": {
            "number": "INV-1",
            "customer": "Dana",
            "issue_date": "2026-08-01",
            "due_date": "2026-09-01",
            "status": "sent",
            "line_items": [
                { "description": "consulting", "quantity": 2.0, "unit_price": 150.0 },
                { "description": "materials", "quantity": 1.0, "unit_price": 40.0 }
            ]
        }
    })
}

// ============================================================================
// SECTION: Flow Tests
// ============================================================================

/// Verifies business creation grants the caller the owner role and audits.
#[test]
fn business_create_grants_owner_and_audits() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    let body = harness
        .store
        .get(&CollectionName::new("businesses"), &DocumentId::new(&business_id))
        .unwrap()
        .unwrap();
    assert_eq!(body["is_active"], json!(true));
    assert_eq!(body["access"]["u1"]["role"], json!("owner"));
    assert_eq!(harness.event_types(&business_id), vec!["FUNCTION_CALL_BUSINESS_CREATE"]);
}

/// Verifies the owner can upsert an invoice with a server-computed total.
#[test]
fn owner_upserts_invoice_with_computed_total() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    let response = harness.call("t-owner", "invoice-upsert", invoice_payload(&business_id)).unwrap();

    assert_eq!(response["number"], json!("INV-1"));
    assert_eq!(response["total"], json!(340.0));
    let body = harness
        .store
        .get(&CollectionName::new("businesses"), &DocumentId::new(&business_id))
        .unwrap()
        .unwrap();
    assert_eq!(body["invoices"]["INV-1"]["total"], json!(340.0));
    assert_eq!(
        harness.event_types(&business_id),
        vec!["FUNCTION_CALL_BUSINESS_CREATE", "FUNCTION_CALL_INVOICE_UPSERT"]
    );
}

/// Verifies a principal without a grant is denied.
#[test]
fn ungranted_principal_is_denied() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    let error =
        harness.call("t-guest", "invoice-upsert", invoice_payload(&business_id)).unwrap_err();

    assert_eq!(error, "permission-denied");
    assert_eq!(harness.event_types(&business_id).len(), 1);
}

/// Verifies staff can append journal entries but not upsert invoices.
#[test]
fn staff_role_scopes_are_enforced() {
    let harness = Harness::new();
    let business_id = harness.create_business();
    harness.grant_role(&business_id, "u3", "staff");

    let entry = json!({
        "id": business_id.as_str(),
        "entry": { "date": "2026-08-06", "memo": "supply run", "amount": -42.5 }
    });
    let response = harness.call("t-staff", "journal-append", entry).unwrap();
    assert_eq!(response["entry_count"], json!(1));

    let error =
        harness.call("t-staff", "invoice-upsert", invoice_payload(&business_id)).unwrap_err();
    assert_eq!(error, "permission-denied");
}

/// Verifies care-log entries append for staff and owners.
#[test]
fn care_log_records_append() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    let nap = json!({
        "id": business_id.as_str(),
        "entry": {
            "kind": "nap",
            "started_at": "2026-08-06T13:00:00Z",
            "ended_at": "2026-08-06T14:30:00Z"
        }
    });
    let feed = json!({
        "id": business_id.as_str(),
        "entry": { "kind": "feed", "amount_ml": 120.0 }
    });

    harness.call("t-owner", "care-log-record", nap).unwrap();
    let response = harness.call("t-owner", "care-log-record", feed).unwrap();

    assert_eq!(response["entry_count"], json!(2));
}

/// Verifies deactivation locks out later restricted calls.
#[test]
fn deactivation_locks_out_restricted_calls() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    harness
        .call("t-owner", "business-deactivate", json!({ "id": business_id.as_str() }))
        .unwrap();
    let error =
        harness.call("t-owner", "invoice-upsert", invoice_payload(&business_id)).unwrap_err();

    assert_eq!(error, "permission-denied");
}

/// Verifies estimate upserts land under their own key space.
#[test]
fn estimate_upsert_writes_estimates() {
    let harness = Harness::new();
    let business_id = harness.create_business();
    harness.grant_role(&business_id, "u2", "admin");

    let payload = json!({
        "id": business_id.as_str(),
        "estimate": {
            "number": "EST-9",
            "customer": "Lee",
            "expiry_date": "2026-10-01",
            "status": "draft",
            "line_items": [
                { "description": "site survey", "quantity": 1.0, "unit_price": 300.0 }
            ]
        }
    });
    let response = harness.call("t-admin", "estimate-upsert", payload).unwrap();

    assert_eq!(response["total"], json!(300.0));
    let body = harness
        .store
        .get(&CollectionName::new("businesses"), &DocumentId::new(&business_id))
        .unwrap()
        .unwrap();
    assert_eq!(body["estimates"]["EST-9"]["customer"], json!("Lee"));
}

/// Verifies contact updates replace the stored contact block.
#[test]
fn contact_update_replaces_contact_block() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    harness
        .call(
            "t-owner",
            "business-update-contact",
            json!({
                "id": business_id.as_str(),
                "contact": { "email": "ops@acme.test", "phone": "555-0100" }
            }),
        )
        .unwrap();

    let body = harness
        .store
        .get(&CollectionName::new("businesses"), &DocumentId::new(&business_id))
        .unwrap()
        .unwrap();
    assert_eq!(body["contact"]["email"], json!("ops@acme.test"));
}

// ============================================================================
// SECTION: Boundary Tests
// ============================================================================

/// Verifies unauthenticated dispatches are rejected.
#[test]
fn anonymous_call_is_unauthenticated() {
    let harness = Harness::new();
    let error = harness.call_anonymous("business-create", json!({ "name": "x" })).unwrap_err();
    assert_eq!(error, "unauthenticated");
}

/// Verifies unknown callable names fail with not-found.
#[test]
fn unknown_callable_is_not_found() {
    let harness = Harness::new();
    let error = harness.call("t-owner", "business-rename", json!({})).unwrap_err();
    assert_eq!(error, "not-found");
}

/// Verifies schema violations are rejected before the handler runs.
#[test]
fn schema_violation_is_invalid_argument() {
    let harness = Harness::new();
    let business_id = harness.create_business();

    let mut payload = invoice_payload(&business_id);
    payload["invoice"]["status"] = json!("archived");
    let error = harness.call("t-owner", "invoice-upsert", payload).unwrap_err();

    assert_eq!(error, "invalid-argument");
    assert_eq!(harness.event_types(&business_id).len(), 1);
}

/// Verifies the definitions listing names every registered callable.
#[test]
fn definitions_cover_all_callables() {
    let harness = Harness::new();
    let mut names: Vec<String> = harness
        .router
        .definitions()
        .into_iter()
        .map(|definition| definition.name.as_str().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "business-create",
            "business-deactivate",
            "business-update-contact",
            "care-log-record",
            "estimate-upsert",
            "invoice-upsert",
            "journal-append",
        ]
    );
}
