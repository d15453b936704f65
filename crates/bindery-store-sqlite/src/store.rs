// crates/bindery-store-sqlite/src/store.rs
// ============================================================================
// Module: Bindery SQLite Store
// Description: Users, client sessions, and change logs backed by SQLite.
// Purpose: Persist relational side data next to the XML documents.
// Dependencies: bindery-core, rusqlite, sha2, thiserror
// ============================================================================

//! ## Overview
//! This module implements the relational side store. It owns three tables:
//! `users` for manager accounts (password digests only), `client_sessions`
//! for customer profiles keyed by email, and `xml_changes_log`, the
//! append-only audit trail of every XML document mutation. The schema is
//! stamped through `PRAGMA user_version` and both open paths run the same
//! idempotent migration and seeding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use bindery_core::AuditEvent;
use bindery_core::AuditSink;
use bindery_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version stamped into `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default row cap for change log listings.
pub const DEFAULT_CHANGE_LOG_LIMIT: usize = 100;
/// Username seeded for the demo manager account.
pub const SEED_MANAGER_USERNAME: &str = "manager";
/// Password seeded for the demo manager account; only its digest is stored.
pub const SEED_MANAGER_PASSWORD: &str = "manager123";
/// Demo customer profiles seeded on first open, as
/// `(email, name, phone, city, address)` tuples.
pub const SEED_CLIENTS: [(&str, &str, &str, &str, &str); 2] = [
    ("anna@example.com", "Anna Kovalenko", "+380671234567", "Kyiv", "10 Khreshchatyk St, apt 5"),
    ("bogdan@example.com", "Bohdan Petrenko", "+380931234567", "Lviv", "25 Svobody Ave, apt 12"),
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database could not be opened or its directory created.
    #[error("sqlite store open error: {0}")]
    Open(String),
    /// `SQLite` engine error while executing a statement.
    #[error("sqlite store db error: {0}")]
    Sql(String),
    /// Schema migration failure or version mismatch.
    #[error("sqlite store schema error: {0}")]
    Schema(String),
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// One manager account row; the password digest never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    /// Row identifier.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Account role.
    pub role: String,
    /// Creation instant, RFC 3339.
    pub created_at: String,
}

/// One customer session row keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSession {
    /// Row identifier.
    pub id: i64,
    /// Unique customer email.
    pub email: String,
    /// Customer name; empty until the profile is filled in.
    pub name: String,
    /// Contact phone; empty until the profile is filled in.
    pub phone: String,
    /// Delivery city; empty until the profile is filled in.
    pub city: String,
    /// Delivery address; empty until the profile is filled in.
    pub address: String,
    /// Last login instant, RFC 3339.
    pub last_login: String,
}

/// One append-only change log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeLogEntry {
    /// Row identifier; newest rows have the highest values.
    pub id: i64,
    /// Document the change applied to (`catalog` or `orders`).
    pub file_type: String,
    /// Operation label, such as `CREATE` or `SOFT_DELETE`.
    pub operation: String,
    /// Affected entity identifier, when one exists.
    pub entity_id: Option<String>,
    /// Acting user.
    pub changed_by: String,
    /// Human-readable description of the change.
    pub change_description: String,
    /// Recording instant, RFC 3339.
    pub timestamp: String,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed store for users, sessions, and the change log.
pub struct SqliteStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the store at the given database path, migrating and seeding it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the database cannot be opened, migrated,
    /// or seeded.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        ensure_parent_dir(path)?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let mut connection = Connection::open_with_flags(path, flags)
            .map_err(|err| StoreError::Open(err.to_string()))?;
        apply_pragmas(&connection)?;
        initialize_schema(&mut connection)?;
        seed(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens an in-memory store, migrating and seeding it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when initialization fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut connection =
            Connection::open_in_memory().map_err(|err| StoreError::Open(err.to_string()))?;
        apply_pragmas(&connection)?;
        initialize_schema(&mut connection)?;
        seed(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Checks credentials against the stored digest.
    ///
    /// Returns `None` when the username is unknown or the password does not
    /// match; the two cases are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let digest = sha256_hex(password.as_bytes());
        let connection = self.guard()?;
        connection
            .query_row(
                "SELECT id, username, role, created_at FROM users WHERE username = ?1 AND \
                 password_digest = ?2",
                params![username, digest],
                user_from_row,
            )
            .optional()
            .map_err(|err| StoreError::Sql(err.to_string()))
    }

    /// Returns the session for an email, creating an empty profile when the
    /// customer is new. Existing profiles only get `last_login` refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the upsert or lookup fails.
    pub fn get_or_create_session(&self, email: &str) -> Result<ClientSession, StoreError> {
        let now = Timestamp::now().to_rfc3339();
        let connection = self.guard()?;
        connection
            .execute(
                "INSERT INTO client_sessions (email, name, phone, city, address, last_login) \
                 VALUES (?1, '', '', '', '', ?2) ON CONFLICT(email) DO UPDATE SET last_login = \
                 excluded.last_login",
                params![email, now],
            )
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        connection
            .query_row(SELECT_SESSION_BY_EMAIL, params![email], session_from_row)
            .map_err(|err| StoreError::Sql(err.to_string()))
    }

    /// Upserts a customer profile keyed by email and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the upsert or lookup fails.
    pub fn update_client_info(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        city: &str,
        address: &str,
    ) -> Result<ClientSession, StoreError> {
        let now = Timestamp::now().to_rfc3339();
        let connection = self.guard()?;
        connection
            .execute(
                "INSERT INTO client_sessions (email, name, phone, city, address, last_login) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT(email) DO UPDATE SET name = \
                 excluded.name, phone = excluded.phone, city = excluded.city, address = \
                 excluded.address",
                params![email, name, phone, city, address, now],
            )
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        connection
            .query_row(SELECT_SESSION_BY_EMAIL, params![email], session_from_row)
            .map_err(|err| StoreError::Sql(err.to_string()))
    }

    /// Looks up a customer profile by email.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    pub fn client_info(&self, email: &str) -> Result<Option<ClientSession>, StoreError> {
        let connection = self.guard()?;
        connection
            .query_row(SELECT_SESSION_BY_EMAIL, params![email], session_from_row)
            .optional()
            .map_err(|err| StoreError::Sql(err.to_string()))
    }

    /// Appends one audit event to the change log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn log_change(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let connection = self.guard()?;
        connection
            .execute(
                "INSERT INTO xml_changes_log (file_type, operation, entity_id, changed_by, \
                 change_description, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.scope.as_str(),
                    event.operation.as_str(),
                    event.entity_id,
                    event.changed_by,
                    event.description,
                    event.timestamp.to_rfc3339(),
                ],
            )
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        Ok(())
    }

    /// Lists change log entries, newest first, capped at `limit` rows
    /// (default [`DEFAULT_CHANGE_LOG_LIMIT`]).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn change_logs(&self, limit: Option<usize>) -> Result<Vec<ChangeLogEntry>, StoreError> {
        let limit = i64::try_from(limit.unwrap_or(DEFAULT_CHANGE_LOG_LIMIT))
            .map_err(|_| StoreError::Sql("change log limit too large".to_string()))?;
        let connection = self.guard()?;
        let mut statement = connection
            .prepare(
                "SELECT id, file_type, operation, entity_id, changed_by, change_description, \
                 timestamp FROM xml_changes_log ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        let rows = statement
            .query_map(params![limit], entry_from_row)
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|err| StoreError::Sql(err.to_string()))?);
        }
        Ok(entries)
    }

    /// Lists all change log entries for one entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    pub fn change_logs_for_entity(
        &self,
        entity_id: &str,
    ) -> Result<Vec<ChangeLogEntry>, StoreError> {
        let connection = self.guard()?;
        let mut statement = connection
            .prepare(
                "SELECT id, file_type, operation, entity_id, changed_by, change_description, \
                 timestamp FROM xml_changes_log WHERE entity_id = ?1 ORDER BY id DESC",
            )
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        let rows = statement
            .query_map(params![entity_id], entry_from_row)
            .map_err(|err| StoreError::Sql(err.to_string()))?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|err| StoreError::Sql(err.to_string()))?);
        }
        Ok(entries)
    }

    /// Locks the shared connection.
    fn guard(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Sql("store mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

impl AuditSink for SqliteStore {
    fn record(&self, event: &AuditEvent) {
        // The change log is advisory: a failed insert must not fail the
        // mutation that produced the event.
        drop(self.log_change(event));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Shared SELECT for session rows.
const SELECT_SESSION_BY_EMAIL: &str = "SELECT id, email, name, phone, city, address, last_login \
                                       FROM client_sessions WHERE email = ?1";

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Open("database path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| StoreError::Open(err.to_string()))
}

/// Applies the `SQLite` pragmas the store relies on.
fn apply_pragmas(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::Open(err.to_string()))?;
    connection
        .execute_batch("PRAGMA journal_mode = wal;")
        .map_err(|err| StoreError::Open(err.to_string()))?;
    connection
        .execute_batch("PRAGMA synchronous = normal;")
        .map_err(|err| StoreError::Open(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
        .map_err(|err| StoreError::Open(err.to_string()))?;
    Ok(())
}

/// Creates the schema on first open or validates the stored version.
fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::Sql(err.to_string()))?;
    let version: i64 = tx
        .query_row("PRAGMA user_version", params![], |row| row.get(0))
        .map_err(|err| StoreError::Schema(err.to_string()))?;
    match version {
        0 => {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT UNIQUE NOT NULL,
                    password_digest TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'manager',
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );
                CREATE TABLE IF NOT EXISTS client_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL,
                    name TEXT,
                    phone TEXT,
                    city TEXT,
                    address TEXT,
                    last_login TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS xml_changes_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_type TEXT NOT NULL,
                    operation TEXT NOT NULL,
                    entity_id TEXT,
                    changed_by TEXT NOT NULL,
                    change_description TEXT NOT NULL,
                    timestamp TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_xml_changes_log_entity
                    ON xml_changes_log (entity_id);",
            )
            .map_err(|err| StoreError::Schema(err.to_string()))?;
            tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
                .map_err(|err| StoreError::Schema(err.to_string()))?;
        }
        value if value == SCHEMA_VERSION => {}
        other => {
            return Err(StoreError::Schema(format!("unsupported schema version: {other}")));
        }
    }
    tx.commit().map_err(|err| StoreError::Sql(err.to_string()))?;
    Ok(())
}

/// Seeds the demo manager account and customer profiles. Reopening an
/// already-seeded database changes nothing.
fn seed(connection: &mut Connection) -> Result<(), StoreError> {
    let now = Timestamp::now().to_rfc3339();
    let tx = connection.transaction().map_err(|err| StoreError::Sql(err.to_string()))?;
    tx.execute(
        "INSERT INTO users (username, password_digest, role, created_at) VALUES (?1, ?2, \
         'manager', ?3) ON CONFLICT(username) DO NOTHING",
        params![SEED_MANAGER_USERNAME, sha256_hex(SEED_MANAGER_PASSWORD.as_bytes()), now],
    )
    .map_err(|err| StoreError::Sql(err.to_string()))?;
    for (email, name, phone, city, address) in SEED_CLIENTS {
        tx.execute(
            "INSERT INTO client_sessions (email, name, phone, city, address, last_login) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6) ON CONFLICT(email) DO NOTHING",
            params![email, name, phone, city, address, now],
        )
        .map_err(|err| StoreError::Sql(err.to_string()))?;
    }
    tx.commit().map_err(|err| StoreError::Sql(err.to_string()))?;
    Ok(())
}

/// Maps a `users` row.
fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Maps a `client_sessions` row, collapsing NULL profile fields to empty.
fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ClientSession> {
    Ok(ClientSession {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        phone: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        city: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        address: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        last_login: row.get(6)?,
    })
}

/// Maps an `xml_changes_log` row.
fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ChangeLogEntry> {
    Ok(ChangeLogEntry {
        id: row.get(0)?,
        file_type: row.get(1)?,
        operation: row.get(2)?,
        entity_id: row.get(3)?,
        changed_by: row.get(4)?,
        change_description: row.get(5)?,
        timestamp: row.get(6)?,
    })
}

/// Returns the lowercase hex SHA-256 digest of the input.
fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
