// crates/bindery-core/src/lib.rs
// ============================================================================
// Module: Bindery Core Library
// Description: Public API surface for the Bindery domain model.
// Purpose: Expose catalog/order types, identifier generation, and audit types.
// Dependencies: crate::{model, audit}
// ============================================================================

//! ## Overview
//! Bindery core defines the bookstore domain: books and orders as they appear
//! in the XML documents, monetary values with fixed two-digit rendering,
//! RFC 3339 timestamps, identifier generation, and the audit event types
//! recorded for every document mutation. It carries no I/O; stores and the
//! HTTP layer build on these types through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod model;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditOperation;
pub use audit::AuditScope;
pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use model::Book;
pub use model::BookId;
pub use model::Customer;
pub use model::DEFAULT_CURRENCY;
pub use model::ModelError;
pub use model::Money;
pub use model::Order;
pub use model::OrderId;
pub use model::OrderItem;
pub use model::OrderStatus;
pub use model::Price;
pub use model::StatusChange;
pub use model::Timestamp;
pub use model::generate_book_id;
pub use model::generate_order_id;
