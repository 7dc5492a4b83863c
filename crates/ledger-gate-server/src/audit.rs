// crates/ledger-gate-server/src/audit.rs
// ============================================================================
// Module: Call Audit Sinks
// Description: JSON-line sinks for gateway decisions and audit failures.
// Purpose: Route observability events to stderr or an append-only file.
// Dependencies: ledger-gate-core, serde, serde_json, time
// ============================================================================

//! ## Overview
//! This module provides the deployable [`CallAuditSink`] implementations. It
//! is intentionally lightweight so deployments can route events to their
//! preferred logging pipeline without redesign: every record is one JSON
//! line tagged with an event label and an RFC 3339 timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use ledger_gate_core::AuditWriteFailure;
use ledger_gate_core::CallAuditRecord;
use ledger_gate_core::CallAuditSink;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Line Format
// ============================================================================

/// JSON line envelope wrapping a sink record.
#[derive(Serialize)]
struct AuditLine<'a, T: Serialize> {
    /// Event label.
    event: &'static str,
    /// RFC 3339 event time.
    time: String,
    /// Wrapped record payload.
    #[serde(flatten)]
    record: &'a T,
}

/// Serializes a record into a tagged JSON line.
fn encode_line<T: Serialize>(event: &'static str, record: &T) -> Option<String> {
    let time = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    serde_json::to_string(&AuditLine {
        event,
        time,
        record,
    })
    .ok()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrCallAuditSink;

impl CallAuditSink for StderrCallAuditSink {
    fn record_call(&self, record: &CallAuditRecord) {
        if let Some(line) = encode_line("callable_invocation", record) {
            let _ = writeln!(io::stderr(), "{line}");
        }
    }

    fn record_audit_write_failure(&self, failure: &AuditWriteFailure) {
        if let Some(line) = encode_line("audit_write_failure", failure) {
            let _ = writeln!(io::stderr(), "{line}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileCallAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileCallAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one line to the log file.
    fn append(&self, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

impl CallAuditSink for FileCallAuditSink {
    fn record_call(&self, record: &CallAuditRecord) {
        if let Some(line) = encode_line("callable_invocation", record) {
            self.append(&line);
        }
    }

    fn record_audit_write_failure(&self, failure: &AuditWriteFailure) {
        if let Some(line) = encode_line("audit_write_failure", failure) {
            self.append(&line);
        }
    }
}
