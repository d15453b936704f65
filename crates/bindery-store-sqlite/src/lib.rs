// crates/bindery-store-sqlite/src/lib.rs
// ============================================================================
// Module: Bindery SQLite Store
// Description: Relational side store for users, sessions, and change logs.
// Purpose: Persist everything that is not part of the XML documents.
// Dependencies: bindery-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides the SQLite-backed side store of the bookstore. The XML
//! documents remain the source of truth for catalog and order data; this
//! store holds manager accounts, customer session profiles, and the
//! append-only log of every XML mutation. Passwords are stored only as
//! SHA-256 digests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::ChangeLogEntry;
pub use store::ClientSession;
pub use store::DEFAULT_CHANGE_LOG_LIMIT;
pub use store::SEED_CLIENTS;
pub use store::SEED_MANAGER_PASSWORD;
pub use store::SEED_MANAGER_USERNAME;
pub use store::SqliteStore;
pub use store::StoreError;
pub use store::UserRecord;
