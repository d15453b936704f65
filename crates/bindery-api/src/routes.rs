// crates/bindery-api/src/routes.rs
// ============================================================================
// Module: API Routes
// Description: The four route groups of the bookstore API.
// Purpose: Share request-scalar helpers across the route modules.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Route handlers live in one module per router: catalog and order CRUD,
//! raw-XML transport, and authentication. This module carries the tolerant
//! scalar type shared by the JSON payloads: numeric form fields may arrive
//! as JSON numbers or as strings, and both spell the same value.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod catalog;
pub mod orders;
pub mod xml;


// ============================================================================
// SECTION: Imports
// ============================================================================

use bindery_xml::SchemaViolation;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Shared Responses
// ============================================================================

/// Response of the stored-document validation endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct ValidationResponse {
    /// Always `true`; validation ran even when the document has violations.
    pub(crate) success: bool,
    /// Whether the stored document satisfies its schema.
    pub(crate) valid: bool,
    /// Violations as `{path, message}` objects, in document order.
    pub(crate) errors: Vec<SchemaViolation>,
}

// ============================================================================
// SECTION: Request Scalars
// ============================================================================

/// Form-tolerant scalar: a number or its string spelling.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrText {
    /// Native JSON number.
    Number(serde_json::Number),
    /// Stringified number, as form-driven clients send it.
    Text(String),
}

impl NumberOrText {
    /// Renders the scalar as trimmed text.
    pub(crate) fn to_text(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

/// Returns the trimmed text when present and non-empty.
pub(crate) fn present(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}

/// Returns the scalar's text when present and non-empty.
pub(crate) fn scalar_present(field: Option<&NumberOrText>) -> Option<String> {
    let text = field?.to_text();
    if text.is_empty() { None } else { Some(text) }
}
