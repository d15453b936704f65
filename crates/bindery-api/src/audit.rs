// crates/bindery-api/src/audit.rs
// ============================================================================
// Module: API Audit Sinks
// Description: Operational audit sinks for the HTTP service.
// Purpose: Mirror document audit events and server lifecycle events as
//          JSON lines, and fan document events out to the SQLite change log.
// Dependencies: bindery-core, bindery-config, bindery-store-sqlite
// ============================================================================

//! ## Overview
//! The service carries no logging framework; these sinks are its operational
//! log. Every document mutation produces an [`AuditEvent`] that always lands
//! in the SQLite change log and is mirrored to the configured sink. Server
//! lifecycle events (startup, failed requests) go to the mirror only, so the
//! change log stays a record of document mutations alone.
//!
//! ## Invariants
//! - Sinks swallow their own failures; recording never fails a request.
//! - One JSON object per line on stderr and file sinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use bindery_config::AuditConfig;
use bindery_config::AuditSinkKind;
use bindery_core::AuditEvent;
use bindery_core::AuditSink;
use bindery_core::Timestamp;
use bindery_store_sqlite::SqliteStore;
use serde::Serialize;

use crate::server::ApiServerError;

// ============================================================================
// SECTION: Server Events
// ============================================================================

/// One server lifecycle event, emitted to the mirror sink only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEvent {
    /// Stable event name.
    pub event: &'static str,
    /// Human-readable detail line.
    pub message: String,
    /// When the event was recorded (RFC 3339).
    pub timestamp: String,
}

impl ServerEvent {
    /// Creates an event stamped with the current instant.
    #[must_use]
    pub fn new(event: &'static str, message: impl Into<String>) -> Self {
        Self {
            event,
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    /// Event recorded once the listener is bound.
    #[must_use]
    pub fn started(addr: SocketAddr) -> Self {
        Self::new("server_started", format!("listening on {addr}"))
    }

    /// Event recorded for every request answered with an error status.
    #[must_use]
    pub fn request_failed(method: &str, path: &str, peer: SocketAddr, status: u16) -> Self {
        Self::new("request_failed", format!("{method} {path} from {peer} -> {status}"))
    }
}

// ============================================================================
// SECTION: Mirror Trait
// ============================================================================

/// Operational mirror sink of the HTTP service.
///
/// The mirror receives every document [`AuditEvent`] alongside the SQLite
/// change log, plus server lifecycle events that never touch the database.
pub trait MirrorAuditSink: Send + Sync {
    /// Record a document mutation event.
    fn record(&self, event: &AuditEvent);

    /// Record a server lifecycle event.
    fn record_server(&self, event: &ServerEvent);
}

// ============================================================================
// SECTION: Stderr Sink
// ============================================================================

/// Mirror sink that writes one JSON line per event to stderr.
pub struct StderrAuditSink;

impl MirrorAuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_server(&self, event: &ServerEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

// ============================================================================
// SECTION: File Sink
// ============================================================================

/// Mirror sink that appends one JSON line per event to a file.
pub struct FileAuditSink {
    /// Append-mode log file.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the sink file in append mode, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Serializes and appends one line, swallowing failures.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl MirrorAuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_server(&self, event: &ServerEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

// ============================================================================
// SECTION: Noop Sink
// ============================================================================

/// Mirror sink that discards every event.
pub struct NoopMirrorSink;

impl MirrorAuditSink for NoopMirrorSink {
    fn record(&self, _event: &AuditEvent) {}

    fn record_server(&self, _event: &ServerEvent) {}
}

// ============================================================================
// SECTION: Fanout
// ============================================================================

/// Document audit sink fanning each event out to the SQLite change log and
/// the configured mirror.
pub struct FanoutAuditSink {
    /// Change log destination; always receives every event.
    store: Arc<SqliteStore>,
    /// Operational mirror.
    mirror: Arc<dyn MirrorAuditSink>,
}

impl FanoutAuditSink {
    /// Builds a fanout over the change log and a mirror.
    #[must_use]
    pub fn new(store: Arc<SqliteStore>, mirror: Arc<dyn MirrorAuditSink>) -> Self {
        Self {
            store,
            mirror,
        }
    }
}

impl AuditSink for FanoutAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.store.record(event);
        self.mirror.record(event);
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the mirror sink named by the audit configuration.
///
/// # Errors
///
/// Returns [`ApiServerError::Init`] when a file sink is configured without a
/// path or the file cannot be opened.
pub fn build_mirror(config: &AuditConfig) -> Result<Arc<dyn MirrorAuditSink>, ApiServerError> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::Off => Ok(Arc::new(NoopMirrorSink)),
        AuditSinkKind::File => {
            let Some(path) = config.path.as_deref() else {
                return Err(ApiServerError::Init("audit.path is not set".to_string()));
            };
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ApiServerError::Init(format!("audit file open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
