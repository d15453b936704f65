// crates/bindery-core/src/audit.rs
// ============================================================================
// Module: Bindery Audit Events
// Description: Structured change events for XML document mutations.
// Purpose: Record who changed which document entity, and let hosts pick sinks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every mutation of `catalog.xml` or `orders.xml` produces one
//! [`AuditEvent`]: the document scope, the operation kind, the entity
//! affected, the acting user, and a human-readable description. Events flow
//! through [`AuditSink`] implementations; the SQLite store appends them to the
//! change log, and the HTTP layer can mirror them to stderr or a file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::model::Timestamp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Document a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditScope {
    /// The catalog document.
    Catalog,
    /// The orders document.
    Orders,
}

impl AuditScope {
    /// Returns the wire string for this scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for AuditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mutation recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOperation {
    /// Entity added to a document.
    Create,
    /// Entity fields replaced or merged.
    Update,
    /// Entity flagged `deleted="true"` but kept in the document.
    SoftDelete,
    /// Entity removed from the document outright.
    HardDelete,
    /// Stock counter changed on a book.
    UpdateStock,
    /// Status transition appended to an order.
    UpdateStatus,
    /// Manager notes replaced on an order.
    UpdateNotes,
    /// Whole-document import applied to the catalog.
    Import,
}

impl AuditOperation {
    /// Returns the wire string for this operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::SoftDelete => "SOFT_DELETE",
            Self::HardDelete => "HARD_DELETE",
            Self::UpdateStock => "UPDATE_STOCK",
            Self::UpdateStatus => "UPDATE_STATUS",
            Self::UpdateNotes => "UPDATE_NOTES",
            Self::Import => "IMPORT",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded document mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Document the change applies to.
    pub scope: AuditScope,
    /// Mutation kind.
    pub operation: AuditOperation,
    /// Affected entity identifier, when one exists.
    pub entity_id: Option<String>,
    /// Acting user (manager username or customer email).
    pub changed_by: String,
    /// Human-readable description of the change.
    pub description: String,
    /// When the change was recorded.
    pub timestamp: Timestamp,
}

impl AuditEvent {
    /// Creates an event stamped with the current instant.
    #[must_use]
    pub fn new(
        scope: AuditScope,
        operation: AuditOperation,
        entity_id: Option<String>,
        changed_by: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            operation,
            entity_id,
            changed_by: changed_by.into(),
            description: description.into(),
            timestamp: Timestamp::now(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for audit events.
///
/// Sinks swallow their own failures; a mutation never fails because its audit
/// record could not be written, matching the append-only log's advisory role.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AuditEvent);
}

/// Sink that discards every event.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;

    #[test]
    fn operation_wire_strings_are_screaming_snake() {
        assert_eq!(AuditOperation::SoftDelete.as_str(), "SOFT_DELETE");
        let json = serde_json::to_string(&AuditOperation::UpdateStock).unwrap();
        assert_eq!(json, "\"UPDATE_STOCK\"");
    }

    #[test]
    fn event_serializes_with_rfc3339_timestamp() {
        let event = AuditEvent::new(
            AuditScope::Catalog,
            AuditOperation::Create,
            Some("book_1_1".to_string()),
            "manager",
            "Added book \"1984\"",
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["scope"], "catalog");
        assert_eq!(value["operation"], "CREATE");
        assert!(
            value["timestamp"].as_str().is_some_and(|s| s.contains('T')),
            "timestamp must be an RFC 3339 string"
        );
    }
}
