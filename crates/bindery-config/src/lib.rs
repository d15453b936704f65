// crates/bindery-config/src/lib.rs
// ============================================================================
// Module: Bindery Config Library
// Description: Canonical config model and validation for the bookstore.
// Purpose: Single source of truth for bindery.toml semantics.
// Dependencies: bindery-xml, serde, toml
// ============================================================================

//! ## Overview
//! `bindery-config` defines the configuration model for the bookstore
//! service: where the XML documents and SQLite database live, which address
//! the HTTP server binds, and where audit events are mirrored. Loading is
//! fail-closed (unreadable, oversized, or invalid files abort startup) with
//! one deliberate exception: a missing file yields the built-in defaults.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::Config;
pub use config::ConfigError;
pub use config::ServerConfig;
pub use config::StorageConfig;
pub use examples::config_toml_example;
