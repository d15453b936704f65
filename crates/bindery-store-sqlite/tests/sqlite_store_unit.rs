// crates/bindery-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Seeding, authentication, sessions, and change log behavior.
// Purpose: Validate the side store against file-backed and in-memory setups.
// ============================================================================

//! ## Overview
//! Unit tests for the SQLite side store:
//! - Idempotent migration and seeding across reopens
//! - Digest-only password storage and authentication
//! - Session upserts keyed by customer email
//! - Append-only change log ordering and limits

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;

use bindery_core::AuditEvent;
use bindery_core::AuditOperation;
use bindery_core::AuditScope;
use bindery_core::AuditSink;
use bindery_store_sqlite::SqliteStore;
use bindery_store_sqlite::StoreError;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sample_event(operation: AuditOperation, entity_id: &str) -> AuditEvent {
    AuditEvent::new(
        AuditScope::Catalog,
        operation,
        Some(entity_id.to_string()),
        "manager",
        format!("{operation} on {entity_id}"),
    )
}

fn count_rows(path: &Path, table: &str) -> i64 {
    let connection = Connection::open(path).unwrap();
    connection
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

// ============================================================================
// SECTION: Seeding
// ============================================================================

#[test]
fn open_seeds_manager_and_demo_clients() {
    let store = SqliteStore::open_in_memory().expect("store init");
    let user = store
        .authenticate("manager", "manager123")
        .expect("authenticate")
        .expect("seeded manager must exist");
    assert_eq!(user.username, "manager");
    assert_eq!(user.role, "manager");

    let anna = store
        .client_info("anna@example.com")
        .expect("client info")
        .expect("seeded client must exist");
    assert_eq!(anna.name, "Anna Kovalenko");
    assert_eq!(anna.city, "Kyiv");
    let bogdan = store
        .client_info("bogdan@example.com")
        .expect("client info")
        .expect("seeded client must exist");
    assert_eq!(bogdan.phone, "+380931234567");
}

#[test]
fn reopening_does_not_duplicate_seed_rows() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bookstore.db");
    let first = SqliteStore::open(&path).expect("first open");
    drop(first);
    let second = SqliteStore::open(&path).expect("second open");
    drop(second);
    assert_eq!(count_rows(&path, "users"), 1);
    assert_eq!(count_rows(&path, "client_sessions"), 2);
}

#[test]
fn passwords_are_stored_only_as_hex_digests() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bookstore.db");
    let store = SqliteStore::open(&path).expect("store init");
    drop(store);
    let connection = Connection::open(&path).unwrap();
    let digest: String = connection
        .query_row("SELECT password_digest FROM users WHERE username = 'manager'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_ne!(digest, "manager123");
    assert_eq!(digest.len(), 64, "SHA-256 digests are 64 hex characters");
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn mismatched_schema_version_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bookstore.db");
    let store = SqliteStore::open(&path).expect("store init");
    drop(store);
    let connection = Connection::open(&path).unwrap();
    connection.execute_batch("PRAGMA user_version = 99;").unwrap();
    drop(connection);
    let Err(err) = SqliteStore::open(&path) else {
        panic!("expected version mismatch to fail");
    };
    assert!(matches!(err, StoreError::Schema(_)));
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

#[test]
fn authenticate_rejects_bad_credentials() {
    let store = SqliteStore::open_in_memory().expect("store init");
    assert!(store.authenticate("manager", "wrong").expect("authenticate").is_none());
    assert!(store.authenticate("nobody", "manager123").expect("authenticate").is_none());
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

#[test]
fn new_email_gets_an_empty_profile() {
    let store = SqliteStore::open_in_memory().expect("store init");
    let session = store.get_or_create_session("new@example.com").expect("session");
    assert_eq!(session.email, "new@example.com");
    assert!(session.name.is_empty());
    assert!(session.city.is_empty());
    assert!(!session.last_login.is_empty());
}

#[test]
fn repeat_login_keeps_the_stored_profile() {
    let store = SqliteStore::open_in_memory().expect("store init");
    let first = store.get_or_create_session("anna@example.com").expect("session");
    assert_eq!(first.name, "Anna Kovalenko");
    let second = store.get_or_create_session("anna@example.com").expect("session");
    assert_eq!(second.name, "Anna Kovalenko");
    assert_eq!(second.address, "10 Khreshchatyk St, apt 5");
    assert_eq!(first.id, second.id, "login must not create a second row");
}

#[test]
fn update_client_info_upserts_by_email() {
    let store = SqliteStore::open_in_memory().expect("store init");
    let updated = store
        .update_client_info("anna@example.com", "Anna Kovalenko", "+380671234567", "Odesa", "7 Derybasivska St")
        .expect("update");
    assert_eq!(updated.city, "Odesa");
    let reread = store.client_info("anna@example.com").expect("client info").expect("row");
    assert_eq!(reread.address, "7 Derybasivska St");

    let created = store
        .update_client_info("olena@example.com", "Olena Shevchenko", "+380501112233", "Dnipro", "3 Yavornytskoho Ave")
        .expect("update");
    assert_eq!(created.name, "Olena Shevchenko");
    assert!(!created.last_login.is_empty());
}

#[test]
fn unknown_email_has_no_client_info() {
    let store = SqliteStore::open_in_memory().expect("store init");
    assert!(store.client_info("ghost@example.com").expect("client info").is_none());
}

// ============================================================================
// SECTION: Change Log
// ============================================================================

#[test]
fn change_logs_list_newest_first() {
    let store = SqliteStore::open_in_memory().expect("store init");
    store.log_change(&sample_event(AuditOperation::Create, "book_1")).expect("log");
    store.log_change(&sample_event(AuditOperation::Update, "book_1")).expect("log");
    store.log_change(&sample_event(AuditOperation::SoftDelete, "book_2")).expect("log");

    let entries = store.change_logs(None).expect("change logs");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].operation, "SOFT_DELETE");
    assert_eq!(entries[2].operation, "CREATE");
    assert!(entries[0].id > entries[2].id);

    let capped = store.change_logs(Some(2)).expect("change logs");
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].operation, "SOFT_DELETE");
}

#[test]
fn change_logs_filter_by_entity() {
    let store = SqliteStore::open_in_memory().expect("store init");
    store.log_change(&sample_event(AuditOperation::Create, "book_1")).expect("log");
    store.log_change(&sample_event(AuditOperation::Create, "book_2")).expect("log");
    store.log_change(&sample_event(AuditOperation::UpdateStock, "book_1")).expect("log");

    let entries = store.change_logs_for_entity("book_1").expect("change logs");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].operation, "UPDATE_STOCK");
    assert!(entries.iter().all(|entry| entry.entity_id.as_deref() == Some("book_1")));
}

#[test]
fn change_log_rows_carry_the_event_fields() {
    let store = SqliteStore::open_in_memory().expect("store init");
    let event = AuditEvent::new(
        AuditScope::Orders,
        AuditOperation::UpdateStatus,
        Some("ORD-000042".to_string()),
        "anna@example.com",
        "Status changed to shipped",
    );
    store.log_change(&event).expect("log");
    let entries = store.change_logs(None).expect("change logs");
    assert_eq!(entries[0].file_type, "orders");
    assert_eq!(entries[0].operation, "UPDATE_STATUS");
    assert_eq!(entries[0].changed_by, "anna@example.com");
    assert_eq!(entries[0].change_description, "Status changed to shipped");
    assert_eq!(entries[0].timestamp, event.timestamp.to_rfc3339());
}

#[test]
fn audit_sink_records_through_the_trait() {
    let store = SqliteStore::open_in_memory().expect("store init");
    let sink: &dyn AuditSink = &store;
    sink.record(&sample_event(AuditOperation::HardDelete, "book_9"));
    let entries = store.change_logs(None).expect("change logs");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, "HARD_DELETE");
}
