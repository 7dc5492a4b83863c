// crates/ledger-gate-server/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: TOML configuration for the Ledger Gate callable server.
// Purpose: Load and validate server, auth, store, and audit settings.
// Dependencies: ledger-gate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file and validated fail-closed before
//! the server starts: an unparseable bind address, a sqlite store without a
//! path, a file audit sink without a path, or malformed auth entries all
//! refuse to boot rather than degrade.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use ledger_gate_store_sqlite::SqliteStoreMode;
use ledger_gate_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default busy timeout for sqlite stores (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum accepted config file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config contents failed validation.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Top-level Ledger Gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerGateConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Call audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Bearer-token identity configuration.
    #[serde(default)]
    pub auth: Option<ServerAuthConfig>,
}

/// Bearer-token identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuthConfig {
    /// Token to principal mappings.
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// One bearer token mapped to a principal id.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
    /// Bearer token value.
    pub token: String,
    /// Principal id resolved for the token.
    pub principal: String,
}

/// Document store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStoreType {
    /// In-memory store for local runs and tests.
    #[default]
    Memory,
    /// Durable sqlite store.
    Sqlite,
}

/// Document store settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    /// Selected store backend.
    #[serde(rename = "type", default)]
    pub store_type: DocumentStoreType,
    /// Database file path (sqlite only).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds (sqlite only).
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Journal mode (sqlite only).
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// Sync mode (sqlite only).
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Call audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// JSON lines to stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard audit records.
    None,
}

/// Call audit sink settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditConfig {
    /// Selected sink.
    #[serde(default)]
    pub sink: AuditSinkType,
    /// Log file path (file sink only).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Returns the default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default sqlite busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Load and Validate
// ============================================================================

impl LedgerGateConfig {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let contents =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration fail-closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any inconsistent setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.server.bind)))?;
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be greater than zero".to_string()));
        }
        if let Some(auth) = self.server.auth.as_ref() {
            let mut seen = BTreeSet::new();
            for entry in &auth.tokens {
                if entry.token.is_empty() {
                    return Err(ConfigError::Invalid("auth token must not be empty".to_string()));
                }
                if entry.principal.is_empty() {
                    return Err(ConfigError::Invalid(
                        "auth principal must not be empty".to_string(),
                    ));
                }
                if !seen.insert(entry.token.as_str()) {
                    return Err(ConfigError::Invalid("duplicate auth token".to_string()));
                }
            }
        }
        if self.store.store_type == DocumentStoreType::Sqlite && self.store.path.is_none() {
            return Err(ConfigError::Invalid("sqlite store requires path".to_string()));
        }
        if self.audit.sink == AuditSinkType::File && self.audit.path.is_none() {
            return Err(ConfigError::Invalid("file audit sink requires path".to_string()));
        }
        Ok(())
    }
}
