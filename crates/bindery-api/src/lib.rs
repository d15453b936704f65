// crates/bindery-api/src/lib.rs
// ============================================================================
// Module: Bindery API
// Description: HTTP service exposing the bookstore over a JSON REST surface.
// Purpose: Route catalog, order, XML, and auth operations onto the stores.
// Dependencies: bindery-core, bindery-xml, bindery-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! This crate serves the bookstore API. The XML document stores remain the
//! source of truth; handlers are thin wrappers that validate request
//! payloads, run one read-modify-write cycle against a store, record an
//! audit event, and answer with the `success` envelope. Catalog and order
//! bodies are JSON; raw document export, import, and schema downloads speak
//! `application/xml`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod error;
pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FanoutAuditSink;
pub use audit::FileAuditSink;
pub use audit::MirrorAuditSink;
pub use audit::NoopMirrorSink;
pub use audit::ServerEvent;
pub use audit::StderrAuditSink;
pub use audit::build_mirror;
pub use error::ApiError;
pub use server::ApiServer;
pub use server::ApiServerError;
pub use server::ServerState;
