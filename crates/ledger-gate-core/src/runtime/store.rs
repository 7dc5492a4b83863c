// crates/ledger-gate-core/src/runtime/store.rs
// ============================================================================
// Module: Ledger Gate In-Memory Store
// Description: Simple in-memory document store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces, rand
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`DocumentStore`] for tests and local runs. Document and event ids are
//! random alphanumeric strings assigned by the store; event timestamps use
//! wall-clock unix milliseconds. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::Value;

use crate::core::audit::AuditEvent;
use crate::core::audit::StoredAuditEvent;
use crate::core::identifiers::CollectionName;
use crate::core::identifiers::DocumentId;
use crate::core::identifiers::EventId;
use crate::interfaces::DocumentStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Length of store-assigned document and event ids.
const STORE_ID_LENGTH: usize = 20;

/// Generates a store-assigned random identifier.
fn generate_id() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(STORE_ID_LENGTH).map(char::from).collect()
}

/// Returns the current wall-clock time in unix milliseconds.
fn unix_millis_now() -> i64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// Builds a unique document key for the in-memory store.
fn document_key(collection: &CollectionName, id: &DocumentId) -> String {
    format!("{collection}/{id}")
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory document store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    /// Document bodies protected by a mutex.
    documents: Arc<Mutex<BTreeMap<String, Value>>>,
    /// Event streams protected by a mutex.
    events: Arc<Mutex<BTreeMap<String, Vec<StoredAuditEvent>>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new in-memory document store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError> {
        let guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Store("document store mutex poisoned".to_string()))?;
        Ok(guard.get(&document_key(collection, id)).cloned())
    }

    fn put(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        body: Value,
    ) -> Result<(), StoreError> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Store("document store mutex poisoned".to_string()))?
            .insert(document_key(collection, id), body);
        Ok(())
    }

    fn create(&self, collection: &CollectionName, body: Value) -> Result<DocumentId, StoreError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Store("document store mutex poisoned".to_string()))?;
        let id = loop {
            let candidate = DocumentId::new(generate_id());
            if !guard.contains_key(&document_key(collection, &candidate)) {
                break candidate;
            }
        };
        guard.insert(document_key(collection, &id), body);
        drop(guard);
        Ok(id)
    }

    fn append_event(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        event: &AuditEvent,
    ) -> Result<StoredAuditEvent, StoreError> {
        let stored = StoredAuditEvent {
            event_id: EventId::new(generate_id()),
            timestamp_ms: unix_millis_now(),
            event: event.clone(),
        };
        self.events
            .lock()
            .map_err(|_| StoreError::Store("document store mutex poisoned".to_string()))?
            .entry(document_key(collection, id))
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    fn events(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Vec<StoredAuditEvent>, StoreError> {
        let guard = self
            .events
            .lock()
            .map_err(|_| StoreError::Store("document store mutex poisoned".to_string()))?;
        Ok(guard.get(&document_key(collection, id)).cloned().unwrap_or_default())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared document store backed by an `Arc` trait object.
///
/// The store client is injected at gateway construction rather than looked
/// up from ambient global state; cloning shares the underlying connection.
#[derive(Clone)]
pub struct SharedDocumentStore {
    /// Inner store implementation.
    inner: Arc<dyn DocumentStore + Send + Sync>,
}

impl SharedDocumentStore {
    /// Wraps a document store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl DocumentStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn DocumentStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl DocumentStore for SharedDocumentStore {
    fn get(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id)
    }

    fn put(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        body: Value,
    ) -> Result<(), StoreError> {
        self.inner.put(collection, id, body)
    }

    fn create(&self, collection: &CollectionName, body: Value) -> Result<DocumentId, StoreError> {
        self.inner.create(collection, body)
    }

    fn append_event(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        event: &AuditEvent,
    ) -> Result<StoredAuditEvent, StoreError> {
        self.inner.append_event(collection, id, event)
    }

    fn events(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Vec<StoredAuditEvent>, StoreError> {
        self.inner.events(collection, id)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
