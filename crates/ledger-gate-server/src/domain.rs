// crates/ledger-gate-server/src/domain.rs
// ============================================================================
// Module: Business Domain Callables
// Description: Payloads, schemas, and handlers for business-record endpoints.
// Purpose: Implement the audited operations over the businesses collection.
// Dependencies: crate::callables, ledger-gate-core, ledger-gate-schema
// ============================================================================

//! ## Overview
//! Every state-changing business operation is registered here as an audited
//! callable: business lifecycle, contact info, invoices, estimates, journal
//! entries, and care logs. Each endpoint pairs a JSON Schema with a typed
//! payload and a handler over the shared document store; handlers return the
//! business id they acted on so every successful call lands exactly one
//! audit event under the business document.
//!
//! ## Invariants
//! - Handlers never bypass the gateway; all writes go through registered
//!   callables.
//! - Invoice and estimate totals are computed server-side from line items.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use ledger_gate_core::AuditedCallable;
use ledger_gate_core::CallAuditSink;
use ledger_gate_core::CallError;
use ledger_gate_core::CallHandler;
use ledger_gate_core::CallOutcome;
use ledger_gate_core::CallPayload;
use ledger_gate_core::CallableSpec;
use ledger_gate_core::CollectionName;
use ledger_gate_core::DocumentId;
use ledger_gate_core::DocumentStore;
use ledger_gate_core::FunctionName;
use ledger_gate_core::PayloadValidator;
use ledger_gate_core::Principal;
use ledger_gate_core::Role;
use ledger_gate_core::SharedDocumentStore;
use ledger_gate_schema::JsonSchemaValidator;
use ledger_gate_schema::SchemaError;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::callables::CallRouter;
use crate::callables::Endpoint;
use crate::callables::RegisteredCallable;

// ============================================================================
// SECTION: Collections and Roles
// ============================================================================

/// Collection holding business documents and their audit events.
const BUSINESSES_COLLECTION: &str = "businesses";

/// Role label: business owner.
pub const ROLE_OWNER: &str = "owner";
/// Role label: business administrator.
pub const ROLE_ADMIN: &str = "admin";
/// Role label: business staff member.
pub const ROLE_STAFF: &str = "staff";

/// Returns the businesses collection name.
fn businesses() -> CollectionName {
    CollectionName::new(BUSINESSES_COLLECTION)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Domain callable registration errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A callable name failed shape validation.
    #[error("invalid callable name: {0}")]
    Name(String),
    /// An endpoint schema failed to compile.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Router registration failed.
    #[error("registration failed: {0}")]
    Register(String),
}

// ============================================================================
// SECTION: Shared Payload Types
// ============================================================================

/// Business contact block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact email address.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// One billable line item on an invoice or estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description.
    pub description: String,
    /// Billed quantity.
    pub quantity: f64,
    /// Price per unit.
    pub unit_price: f64,
}

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Not yet sent to the customer.
    Draft,
    /// Sent and awaiting payment.
    Sent,
    /// Paid in full.
    Paid,
}

/// Estimate lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    /// Not yet sent to the customer.
    Draft,
    /// Sent and awaiting a decision.
    Sent,
    /// Accepted by the customer.
    Accepted,
    /// Declined by the customer.
    Declined,
}

/// Care log entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareLogKind {
    /// Sleep period.
    Nap,
    /// Feeding.
    Feed,
    /// Diaper change.
    Diaper,
    /// Growth measurement.
    Growth,
}

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// Payload for `business-create`.
#[derive(Debug, Deserialize)]
pub struct BusinessCreateRequest {
    /// Business display name.
    pub name: String,
    /// Optional initial contact block.
    pub contact: Option<ContactInfo>,
}

impl CallPayload for BusinessCreateRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        None
    }
}

/// Payload for `business-update-contact`.
#[derive(Debug, Deserialize)]
pub struct ContactUpdateRequest {
    /// Target business id.
    pub id: DocumentId,
    /// Replacement contact block.
    pub contact: ContactInfo,
}

impl CallPayload for ContactUpdateRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        Some(&self.id)
    }
}

/// Payload for `business-deactivate`.
#[derive(Debug, Deserialize)]
pub struct BusinessDeactivateRequest {
    /// Target business id.
    pub id: DocumentId,
}

impl CallPayload for BusinessDeactivateRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        Some(&self.id)
    }
}

/// Invoice fields written by `invoice-upsert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceBody {
    /// Invoice number, unique within the business.
    pub number: String,
    /// Customer display name.
    pub customer: String,
    /// Issue date (`YYYY-MM-DD`).
    pub issue_date: Option<String>,
    /// Due date (`YYYY-MM-DD`).
    pub due_date: Option<String>,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// Billable line items.
    pub line_items: Vec<LineItem>,
}

/// Payload for `invoice-upsert`.
#[derive(Debug, Deserialize)]
pub struct InvoiceUpsertRequest {
    /// Target business id.
    pub id: DocumentId,
    /// Invoice fields to write.
    pub invoice: InvoiceBody,
}

impl CallPayload for InvoiceUpsertRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        Some(&self.id)
    }
}

/// Estimate fields written by `estimate-upsert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateBody {
    /// Estimate number, unique within the business.
    pub number: String,
    /// Customer display name.
    pub customer: String,
    /// Expiry date (`YYYY-MM-DD`).
    pub expiry_date: Option<String>,
    /// Lifecycle status.
    pub status: EstimateStatus,
    /// Billable line items.
    pub line_items: Vec<LineItem>,
}

/// Payload for `estimate-upsert`.
#[derive(Debug, Deserialize)]
pub struct EstimateUpsertRequest {
    /// Target business id.
    pub id: DocumentId,
    /// Estimate fields to write.
    pub estimate: EstimateBody,
}

impl CallPayload for EstimateUpsertRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        Some(&self.id)
    }
}

/// One journal entry appended by `journal-append`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry date (`YYYY-MM-DD`).
    pub date: String,
    /// Free-form memo.
    pub memo: String,
    /// Signed amount.
    pub amount: f64,
    /// Optional category label.
    pub category: Option<String>,
}

/// Payload for `journal-append`.
#[derive(Debug, Deserialize)]
pub struct JournalAppendRequest {
    /// Target business id.
    pub id: DocumentId,
    /// Entry to append.
    pub entry: JournalEntry,
}

impl CallPayload for JournalAppendRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        Some(&self.id)
    }
}

/// One care log entry appended by `care-log-record`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareLogEntry {
    /// Entry kind.
    pub kind: CareLogKind,
    /// Start time (RFC 3339).
    pub started_at: Option<String>,
    /// End time (RFC 3339).
    pub ended_at: Option<String>,
    /// Feed amount in milliliters.
    pub amount_ml: Option<f64>,
    /// Measured weight in kilograms.
    pub weight_kg: Option<f64>,
    /// Free-form note.
    pub note: Option<String>,
}

/// Payload for `care-log-record`.
#[derive(Debug, Deserialize)]
pub struct CareLogRecordRequest {
    /// Target business id.
    pub id: DocumentId,
    /// Entry to append.
    pub entry: CareLogEntry,
}

impl CallPayload for CareLogRecordRequest {
    fn business_id(&self) -> Option<&DocumentId> {
        Some(&self.id)
    }
}

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Shared schema fragment for contact blocks.
fn contact_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "email": { "type": ["string", "null"] },
            "phone": { "type": ["string", "null"] },
            "address": { "type": ["string", "null"] }
        }
    })
}

/// Shared schema fragment for line items.
fn line_items_schema() -> Value {
    json!({
        "type": "array",
        "minItems": 1,
        "items": {
            "type": "object",
            "additionalProperties": false,
            "required": ["description", "quantity", "unit_price"],
            "properties": {
                "description": { "type": "string", "minLength": 1 },
                "quantity": { "type": "number", "minimum": 0 },
                "unit_price": { "type": "number", "minimum": 0 }
            }
        }
    })
}

/// Schema for `business-create`.
fn business_create_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["name"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "contact": contact_schema()
        }
    })
}

/// Schema for `business-update-contact`.
fn contact_update_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["id", "contact"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "contact": contact_schema()
        }
    })
}

/// Schema for `business-deactivate`.
fn business_deactivate_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["id"],
        "properties": {
            "id": { "type": "string", "minLength": 1 }
        }
    })
}

/// Schema for `invoice-upsert`.
fn invoice_upsert_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["id", "invoice"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "invoice": {
                "type": "object",
                "additionalProperties": false,
                "required": ["number", "customer", "status", "line_items"],
                "properties": {
                    "number": { "type": "string", "pattern": "^[A-Za-z0-9-]{1,32}$" },
                    "customer": { "type": "string", "minLength": 1 },
                    "issue_date": { "type": ["string", "null"], "format": "date" },
                    "due_date": { "type": ["string", "null"], "format": "date" },
                    "status": { "enum": ["draft", "sent", "paid"] },
                    "line_items": line_items_schema()
                }
            }
        }
    })
}

/// Schema for `estimate-upsert`.
fn estimate_upsert_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["id", "estimate"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "estimate": {
                "type": "object",
                "additionalProperties": false,
                "required": ["number", "customer", "status", "line_items"],
                "properties": {
                    "number": { "type": "string", "pattern": "^[A-Za-z0-9-]{1,32}$" },
                    "customer": { "type": "string", "minLength": 1 },
                    "expiry_date": { "type": ["string", "null"], "format": "date" },
                    "status": { "enum": ["draft", "sent", "accepted", "declined"] },
                    "line_items": line_items_schema()
                }
            }
        }
    })
}

/// Schema for `journal-append`.
fn journal_append_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["id", "entry"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "entry": {
                "type": "object",
                "additionalProperties": false,
                "required": ["date", "memo", "amount"],
                "properties": {
                    "date": { "type": "string", "format": "date" },
                    "memo": { "type": "string", "minLength": 1 },
                    "amount": { "type": "number" },
                    "category": { "type": ["string", "null"] }
                }
            }
        }
    })
}

/// Schema for `care-log-record`.
fn care_log_record_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["id", "entry"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "entry": {
                "type": "object",
                "additionalProperties": false,
                "required": ["kind"],
                "properties": {
                    "kind": { "enum": ["nap", "feed", "diaper", "growth"] },
                    "started_at": { "type": ["string", "null"], "format": "date-time" },
                    "ended_at": { "type": ["string", "null"], "format": "date-time" },
                    "amount_ml": { "type": ["number", "null"], "minimum": 0 },
                    "weight_kg": { "type": ["number", "null"], "minimum": 0 },
                    "note": { "type": ["string", "null"] }
                }
            }
        }
    })
}

// ============================================================================
// SECTION: Handler Helpers
// ============================================================================

/// Maps a store fault into the gateway-internal error kind.
fn internal(err: impl std::fmt::Display) -> CallError {
    CallError::Internal(err.to_string())
}

/// Loads a business document, failing with not-found when absent.
fn load_business(store: &SharedDocumentStore, id: &DocumentId) -> Result<Value, CallError> {
    store
        .get(&businesses(), id)
        .map_err(internal)?
        .ok_or_else(|| CallError::NotFound(format!("business {id} not found")))
}

/// Saves a business document body.
fn save_business(
    store: &SharedDocumentStore,
    id: &DocumentId,
    body: Value,
) -> Result<(), CallError> {
    store.put(&businesses(), id, body).map_err(internal)
}

/// Returns the mutable field map of a document body.
fn object_fields(body: &mut Value) -> Result<&mut Map<String, Value>, CallError> {
    body.as_object_mut()
        .ok_or_else(|| CallError::Internal("business document is not an object".to_string()))
}

/// Builds the standard success outcome for a business-scoped call.
fn business_outcome(id: DocumentId, response: Value) -> CallOutcome {
    CallOutcome {
        entity_id: Some(id),
        response,
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Creates a business document owned by the caller.
fn business_create(
    store: &SharedDocumentStore,
    principal: &Principal,
    input: BusinessCreateRequest,
) -> Result<CallOutcome, CallError> {
    let mut access = Map::new();
    access.insert(principal.id.as_str().to_string(), json!({ "role": ROLE_OWNER }));
    let contact = serde_json::to_value(&input.contact).map_err(internal)?;
    let body = json!({
        "name": input.name,
        "is_active": true,
        "access": access,
        "contact": contact,
        "invoices": {},
        "estimates": {},
        "journal": [],
        "care_log": [],
    });
    let id = store.create(&businesses(), body).map_err(internal)?;
    let response = json!({ "id": id.as_str() });
    Ok(business_outcome(id, response))
}

/// Replaces the contact block of a business.
fn contact_update(
    store: &SharedDocumentStore,
    input: ContactUpdateRequest,
) -> Result<CallOutcome, CallError> {
    let mut body = load_business(store, &input.id)?;
    let contact = serde_json::to_value(&input.contact).map_err(internal)?;
    object_fields(&mut body)?.insert("contact".to_string(), contact);
    save_business(store, &input.id, body)?;
    let response = json!({ "id": input.id.as_str() });
    Ok(business_outcome(input.id, response))
}

/// Deactivates a business, locking out further restricted calls.
fn business_deactivate(
    store: &SharedDocumentStore,
    input: BusinessDeactivateRequest,
) -> Result<CallOutcome, CallError> {
    let mut body = load_business(store, &input.id)?;
    object_fields(&mut body)?.insert("is_active".to_string(), json!(false));
    save_business(store, &input.id, body)?;
    let response = json!({ "id": input.id.as_str(), "is_active": false });
    Ok(business_outcome(input.id, response))
}

/// Writes an invoice keyed by its number, computing the total server-side.
fn invoice_upsert(
    store: &SharedDocumentStore,
    input: InvoiceUpsertRequest,
) -> Result<CallOutcome, CallError> {
    let total: f64 =
        input.invoice.line_items.iter().map(|item| item.quantity * item.unit_price).sum();
    let mut record = serde_json::to_value(&input.invoice).map_err(internal)?;
    object_fields(&mut record)?.insert("total".to_string(), json!(total));

    let mut body = load_business(store, &input.id)?;
    let fields = object_fields(&mut body)?;
    let invoices = fields.entry("invoices".to_string()).or_insert_with(|| json!({}));
    invoices
        .as_object_mut()
        .ok_or_else(|| CallError::Internal("invoices field is not an object".to_string()))?
        .insert(input.invoice.number.clone(), record);
    save_business(store, &input.id, body)?;

    let response =
        json!({ "id": input.id.as_str(), "number": input.invoice.number, "total": total });
    Ok(business_outcome(input.id, response))
}

/// Writes an estimate keyed by its number, computing the total server-side.
fn estimate_upsert(
    store: &SharedDocumentStore,
    input: EstimateUpsertRequest,
) -> Result<CallOutcome, CallError> {
    let total: f64 =
        input.estimate.line_items.iter().map(|item| item.quantity * item.unit_price).sum();
    let mut record = serde_json::to_value(&input.estimate).map_err(internal)?;
    object_fields(&mut record)?.insert("total".to_string(), json!(total));

    let mut body = load_business(store, &input.id)?;
    let fields = object_fields(&mut body)?;
    let estimates = fields.entry("estimates".to_string()).or_insert_with(|| json!({}));
    estimates
        .as_object_mut()
        .ok_or_else(|| CallError::Internal("estimates field is not an object".to_string()))?
        .insert(input.estimate.number.clone(), record);
    save_business(store, &input.id, body)?;

    let response =
        json!({ "id": input.id.as_str(), "number": input.estimate.number, "total": total });
    Ok(business_outcome(input.id, response))
}

/// Appends one entry to the business journal.
fn journal_append(
    store: &SharedDocumentStore,
    input: JournalAppendRequest,
) -> Result<CallOutcome, CallError> {
    let entry = serde_json::to_value(&input.entry).map_err(internal)?;
    let mut body = load_business(store, &input.id)?;
    let fields = object_fields(&mut body)?;
    let journal = fields
        .entry("journal".to_string())
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(|| CallError::Internal("journal field is not an array".to_string()))?;
    journal.push(entry);
    let entry_count = journal.len();
    save_business(store, &input.id, body)?;

    let response = json!({ "id": input.id.as_str(), "entry_count": entry_count });
    Ok(business_outcome(input.id, response))
}

/// Appends one care log entry to the business record.
fn care_log_record(
    store: &SharedDocumentStore,
    input: CareLogRecordRequest,
) -> Result<CallOutcome, CallError> {
    let entry = serde_json::to_value(&input.entry).map_err(internal)?;
    let mut body = load_business(store, &input.id)?;
    let fields = object_fields(&mut body)?;
    let log = fields
        .entry("care_log".to_string())
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(|| CallError::Internal("care_log field is not an array".to_string()))?;
    log.push(entry);
    let entry_count = log.len();
    save_business(store, &input.id, body)?;

    let response = json!({ "id": input.id.as_str(), "entry_count": entry_count });
    Ok(business_outcome(input.id, response))
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Parses a statically known callable name.
fn function(name: &'static str) -> Result<FunctionName, DomainError> {
    FunctionName::parse(name).ok_or_else(|| DomainError::Name(name.to_string()))
}

/// Builds a role set from role labels.
fn roles(labels: &[&str]) -> BTreeSet<Role> {
    labels.iter().map(|label| Role::new(*label)).collect()
}

/// Builds a registered endpoint from a spec, schema, and handler.
fn endpoint<T>(
    spec: CallableSpec,
    schema: &Value,
    handler: impl CallHandler<T> + 'static,
    store: &SharedDocumentStore,
    audit: &Arc<dyn CallAuditSink>,
    summary: &'static str,
) -> Result<Box<dyn RegisteredCallable>, DomainError>
where
    T: CallPayload + DeserializeOwned + 'static,
{
    let validator: Arc<dyn PayloadValidator<T>> = Arc::new(JsonSchemaValidator::new(schema)?);
    let callable = AuditedCallable::new(spec, validator, handler, store.clone(), audit.clone());
    Ok(Box::new(Endpoint::new(callable, summary)))
}

/// Registers every business-domain callable on the router.
///
/// # Errors
///
/// Returns [`DomainError`] when a schema fails to compile or a name is
/// already registered.
pub fn register_domain_callables(
    router: &mut CallRouter,
    store: &SharedDocumentStore,
    audit: &Arc<dyn CallAuditSink>,
) -> Result<(), DomainError> {
    let register = |router: &mut CallRouter,
                    callable: Box<dyn RegisteredCallable>|
     -> Result<(), DomainError> {
        router.register(callable).map_err(|err| DomainError::Register(err.to_string()))
    };

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::open(function("business-create")?, businesses()).create_operation(),
            &business_create_schema(),
            move |principal: &Principal, input: BusinessCreateRequest| {
                business_create(&handler_store, principal, input)
            },
            store,
            audit,
            "Create a business and grant the caller the owner role.",
        )?,
    )?;

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::restricted(
                function("business-update-contact")?,
                businesses(),
                roles(&[ROLE_OWNER, ROLE_ADMIN]),
            ),
            &contact_update_schema(),
            move |_principal: &Principal, input: ContactUpdateRequest| {
                contact_update(&handler_store, input)
            },
            store,
            audit,
            "Replace the business contact block.",
        )?,
    )?;

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::restricted(
                function("business-deactivate")?,
                businesses(),
                roles(&[ROLE_OWNER]),
            ),
            &business_deactivate_schema(),
            move |_principal: &Principal, input: BusinessDeactivateRequest| {
                business_deactivate(&handler_store, input)
            },
            store,
            audit,
            "Deactivate a business, locking out restricted calls.",
        )?,
    )?;

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::restricted(
                function("invoice-upsert")?,
                businesses(),
                roles(&[ROLE_OWNER, ROLE_ADMIN]),
            ),
            &invoice_upsert_schema(),
            move |_principal: &Principal, input: InvoiceUpsertRequest| {
                invoice_upsert(&handler_store, input)
            },
            store,
            audit,
            "Create or replace an invoice keyed by its number.",
        )?,
    )?;

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::restricted(
                function("estimate-upsert")?,
                businesses(),
                roles(&[ROLE_OWNER, ROLE_ADMIN]),
            ),
            &estimate_upsert_schema(),
            move |_principal: &Principal, input: EstimateUpsertRequest| {
                estimate_upsert(&handler_store, input)
            },
            store,
            audit,
            "Create or replace an estimate keyed by its number.",
        )?,
    )?;

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::restricted(
                function("journal-append")?,
                businesses(),
                roles(&[ROLE_OWNER, ROLE_ADMIN, ROLE_STAFF]),
            ),
            &journal_append_schema(),
            move |_principal: &Principal, input: JournalAppendRequest| {
                journal_append(&handler_store, input)
            },
            store,
            audit,
            "Append a dated journal entry.",
        )?,
    )?;

    let handler_store = store.clone();
    register(
        router,
        endpoint(
            CallableSpec::restricted(
                function("care-log-record")?,
                businesses(),
                roles(&[ROLE_OWNER, ROLE_STAFF]),
            ),
            &care_log_record_schema(),
            move |_principal: &Principal, input: CareLogRecordRequest| {
                care_log_record(&handler_store, input)
            },
            store,
            audit,
            "Append a nap, feed, diaper, or growth log entry.",
        )?,
    )?;

    Ok(())
}
