// crates/bindery-api/src/error.rs
// ============================================================================
// Module: API Errors
// Description: Request failure classes and their HTTP envelope rendering.
// Purpose: Map store, document, and validation failures onto status codes.
// Dependencies: bindery-core, bindery-xml, bindery-store-sqlite, axum
// ============================================================================

//! ## Overview
//! Every failed request answers with the same envelope:
//! `{"success": false, "error": message}`, plus an `errors` array of
//! `{path, message}` objects when schema validation failed. Handlers either
//! build an [`ApiError`] directly for endpoint-specific messages or convert
//! store errors through the `From` impls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use bindery_core::ModelError;
use bindery_store_sqlite::StoreError;
use bindery_xml::DocError;
use bindery_xml::SchemaViolation;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Type
// ============================================================================

/// Request failure mapped onto an HTTP status and the error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload or parameter validation failed.
    #[error("{0}")]
    BadRequest(String),
    /// A document failed schema validation; every violation is carried.
    #[error("{message}")]
    Violations {
        /// Envelope message.
        message: String,
        /// Structural violations, in document order.
        violations: Vec<SchemaViolation>,
    },
    /// Credentials were missing or wrong.
    #[error("{0}")]
    Unauthorized(String),
    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Store or I/O failure the client cannot repair.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status this failure answers with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::Violations {
                ..
            } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Wire form of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    /// Always `false`.
    success: bool,
    /// Human-readable message.
    error: String,
    /// Structural violations when schema validation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [SchemaViolation]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errors = match &self {
            Self::Violations {
                violations, ..
            } => Some(violations.as_slice()),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            errors,
        };
        (self.status(), Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl From<DocError> for ApiError {
    fn from(err: DocError) -> Self {
        match err {
            DocError::Invalid(violations) => Self::Violations {
                message: "XML failed schema validation".to_string(),
                violations,
            },
            DocError::NotFound => Self::NotFound("Entry not found".to_string()),
            // A stored document that no longer parses or maps is server-side
            // damage, not a client mistake.
            DocError::Io(detail) | DocError::Model(detail) => Self::Internal(detail),
            DocError::Parse(parse) => Self::Internal(parse.to_string()),
            DocError::Schema(schema) => Self::Internal(schema.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
