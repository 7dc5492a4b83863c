// crates/ledger-gate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Document Store
// Description: Durable DocumentStore backed by SQLite WAL.
// Purpose: Persist document bodies and append-only audit event streams.
// Dependencies: ledger-gate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`DocumentStore`] using `SQLite`.
//! Document bodies are stored as JSON text keyed by collection and id; audit
//! events land in an append-only table ordered by an autoincrement sequence
//! with store-assigned event ids and timestamps. Opens fail closed on schema
//! version mismatches and payloads are size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use ledger_gate_core::AuditEvent;
use ledger_gate_core::CollectionName;
use ledger_gate_core::DocumentId;
use ledger_gate_core::DocumentStore;
use ledger_gate_core::EventId;
use ledger_gate_core::StoreError;
use ledger_gate_core::StoredAuditEvent;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Length of store-assigned document and event ids.
const STORE_ID_LENGTH: usize = 20;
/// Maximum serialized size accepted for a document body or event.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` document store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store payload exceeded configured size limits.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "body_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed document store with WAL support.
#[derive(Clone, Debug)]
pub struct SqliteDocumentStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Opens an `SQLite`-backed document store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Serializes a JSON body enforcing the store size limit.
    fn encode_body(body: &Value) -> Result<String, SqliteStoreError> {
        let encoded =
            serde_json::to_string(body).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if encoded.len() > MAX_DOCUMENT_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_DOCUMENT_BYTES,
                actual_bytes: encoded.len(),
            });
        }
        Ok(encoded)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        let body: Option<String> = guard
            .query_row(
                "SELECT body_json FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection.as_str(), id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Store(err.to_string()))?;
        drop(guard);
        match body {
            None => Ok(None),
            Some(encoded) => serde_json::from_str(&encoded)
                .map(Some)
                .map_err(|err| StoreError::Invalid(err.to_string())),
        }
    }

    fn put(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        body: Value,
    ) -> Result<(), StoreError> {
        let encoded = Self::encode_body(&body).map_err(StoreError::from)?;
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        guard
            .execute(
                "INSERT INTO documents (collection, doc_id, body_json, updated_at_ms) VALUES \
                 (?1, ?2, ?3, ?4) ON CONFLICT(collection, doc_id) DO UPDATE SET body_json = \
                 excluded.body_json, updated_at_ms = excluded.updated_at_ms",
                params![collection.as_str(), id.as_str(), encoded, unix_millis()],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    fn create(&self, collection: &CollectionName, body: Value) -> Result<DocumentId, StoreError> {
        let encoded = Self::encode_body(&body).map_err(StoreError::from)?;
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        // INSERT OR IGNORE resolves the unlikely id collision by retrying.
        let id = loop {
            let candidate = generate_id();
            let inserted = guard
                .execute(
                    "INSERT OR IGNORE INTO documents (collection, doc_id, body_json, \
                     updated_at_ms) VALUES (?1, ?2, ?3, ?4)",
                    params![collection.as_str(), candidate, encoded, unix_millis()],
                )
                .map_err(|err| StoreError::Store(err.to_string()))?;
            if inserted == 1 {
                break DocumentId::new(candidate);
            }
        };
        drop(guard);
        Ok(id)
    }

    fn append_event(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        event: &AuditEvent,
    ) -> Result<StoredAuditEvent, StoreError> {
        let encoded = serde_json::to_string(event)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        if encoded.len() > MAX_DOCUMENT_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_DOCUMENT_BYTES,
                actual_bytes: encoded.len(),
            }
            .into());
        }
        let event_id = generate_id();
        let timestamp_ms = unix_millis();
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        guard
            .execute(
                "INSERT INTO document_events (collection, doc_id, event_id, timestamp_ms, \
                 body_json) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![collection.as_str(), id.as_str(), event_id, timestamp_ms, encoded],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        drop(guard);
        Ok(StoredAuditEvent {
            event_id: EventId::new(event_id),
            timestamp_ms,
            event: event.clone(),
        })
    }

    fn events(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
    ) -> Result<Vec<StoredAuditEvent>, StoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        let mut statement = guard
            .prepare(
                "SELECT event_id, timestamp_ms, body_json FROM document_events WHERE collection \
                 = ?1 AND doc_id = ?2 ORDER BY seq ASC",
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let rows = statement
            .query_map(params![collection.as_str(), id.as_str()], |row| {
                let event_id: String = row.get(0)?;
                let timestamp_ms: i64 = row.get(1)?;
                let body: String = row.get(2)?;
                Ok((event_id, timestamp_ms, body))
            })
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let mut events = Vec::new();
        for row in rows {
            let (event_id, timestamp_ms, body) =
                row.map_err(|err| StoreError::Store(err.to_string()))?;
            let event: AuditEvent = serde_json::from_str(&body)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            events.push(StoredAuditEvent {
                event_id: EventId::new(event_id),
                timestamp_ms,
                event,
            });
        }
        Ok(events)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Store("mutex poisoned".to_string()))?;
        guard
            .query_row("SELECT 1", params![], |_| Ok(()))
            .map_err(|err| StoreError::Store(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Generates a store-assigned random identifier.
fn generate_id() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(STORE_ID_LENGTH).map(char::from).collect()
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS documents (
                    collection TEXT NOT NULL,
                    doc_id TEXT NOT NULL,
                    body_json TEXT NOT NULL,
                    updated_at_ms INTEGER NOT NULL,
                    PRIMARY KEY (collection, doc_id)
                );
                CREATE TABLE IF NOT EXISTS document_events (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    collection TEXT NOT NULL,
                    doc_id TEXT NOT NULL,
                    event_id TEXT NOT NULL UNIQUE,
                    timestamp_ms INTEGER NOT NULL,
                    body_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_document_events_doc
                    ON document_events (collection, doc_id, seq);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
