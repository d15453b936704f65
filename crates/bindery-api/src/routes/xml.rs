// crates/bindery-api/src/routes/xml.rs
// ============================================================================
// Module: XML Routes
// Description: Raw document transport: export, import, schemas, stylesheets.
// Purpose: Move whole XML documents in and out without losing validation.
// Dependencies: bindery-core, bindery-xml, bindery-store-sqlite, axum
// ============================================================================

//! ## Overview
//! These endpoints speak `application/xml` where the rest of the API speaks
//! JSON. Imports parse and validate the uploaded document before any merge
//! touches the stored catalog, so a rejected upload leaves the document
//! untouched. The change log is exposed read-only at the end of the router.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::header;
use axum::routing::get;
use axum::routing::post;
use bindery_core::AuditEvent;
use bindery_core::AuditOperation;
use bindery_core::AuditScope;
use bindery_core::Book;
use bindery_store_sqlite::ChangeLogEntry;
use bindery_xml::CATALOG_FILE;
use bindery_xml::DocError;
use bindery_xml::ORDERS_FILE;
use bindery_xml::SchemaViolation;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ApiError;
use crate::server::ServerState;
use crate::server::run_blocking;

/// Audit actor recorded for imports.
const DEFAULT_ACTOR: &str = "manager";

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the XML transport router.
pub(crate) fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/catalog", get(export_catalog))
        .route("/orders", get(export_orders))
        .route("/xsd/{kind}", get(get_schema))
        .route("/xslt/{name}", get(get_stylesheet))
        .route("/import/catalog", post(import_catalog))
        .route("/validate/catalog", post(validate_catalog))
        .route("/validate/orders", post(validate_orders))
        .route("/changes", get(list_changes))
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// An XML body plus its transport headers.
type XmlResponse = ([(HeaderName, String); 2], String);

/// Query parameters of the import endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImportQuery {
    /// Merge mode: `add` (default), `update`, or `replace`.
    #[serde(default)]
    pub(crate) mode: Option<String>,
}

/// Query parameters of the change-log endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChangesQuery {
    /// Row cap; the store default applies when absent.
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// Restricts the listing to one entity's history.
    #[serde(default)]
    pub(crate) entity: Option<String>,
}

/// How an uploaded catalog merges into the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportMode {
    /// Append only books whose ID is not already present.
    Add,
    /// Replace matching IDs in place, append the rest.
    Update,
    /// Swap the whole catalog.
    Replace,
}

impl ImportMode {
    /// Wire name, as the `mode` query parameter spells it.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Replace => "replace",
        }
    }
}

/// Import response.
#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Import outcome.
    pub(crate) message: &'static str,
    /// Number of books the merge applied.
    pub(crate) count: usize,
}

/// Stored-document validation response with a verdict line.
#[derive(Debug, Serialize)]
pub(crate) struct VerdictResponse {
    /// Always `true`; validation ran even when the document has violations.
    pub(crate) success: bool,
    /// Whether the stored document satisfies its schema.
    pub(crate) valid: bool,
    /// Violations as `{path, message}` objects.
    pub(crate) errors: Vec<SchemaViolation>,
    /// Human-readable verdict.
    pub(crate) message: &'static str,
}

/// Change-log listing response.
#[derive(Debug, Serialize)]
pub(crate) struct ChangesResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Number of entries returned.
    pub(crate) count: usize,
    /// Entries, newest first.
    pub(crate) changes: Vec<ChangeLogEntry>,
}

// ============================================================================
// SECTION: Export Handlers
// ============================================================================

/// `GET /catalog`: the stored catalog document, as a download.
pub(crate) async fn export_catalog(
    State(state): State<Arc<ServerState>>,
) -> Result<XmlResponse, ApiError> {
    let text = run_blocking(|| state.catalog.raw_xml())?;
    Ok(attachment(CATALOG_FILE, text))
}

/// `GET /orders`: the stored orders document, as a download.
pub(crate) async fn export_orders(
    State(state): State<Arc<ServerState>>,
) -> Result<XmlResponse, ApiError> {
    let text = run_blocking(|| state.orders.raw_xml())?;
    Ok(attachment(ORDERS_FILE, text))
}

/// `GET /xsd/{kind}`: one of the two embedded schemas.
pub(crate) async fn get_schema(
    State(state): State<Arc<ServerState>>,
    Path(kind): Path<String>,
) -> Result<XmlResponse, ApiError> {
    let source = match kind.as_str() {
        "catalog" => state.catalog.schema_text(),
        "orders" => state.orders.schema_text(),
        _ => return Err(ApiError::BadRequest("Unknown schema kind".to_string())),
    };
    Ok(inline_xml(source.to_string()))
}

/// `GET /xslt/{name}`: one stylesheet from the configured directory.
pub(crate) async fn get_stylesheet(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<XmlResponse, ApiError> {
    if !stylesheet_name_ok(&name) {
        return Err(ApiError::BadRequest("Invalid stylesheet name".to_string()));
    }
    let path = state.xslt_dir.join(format!("{name}.xsl"));
    let text = run_blocking(|| fs::read_to_string(&path)).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            ApiError::NotFound("Stylesheet not found".to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    })?;
    Ok(inline_xml(text))
}

// ============================================================================
// SECTION: Import Handler
// ============================================================================

/// `POST /import/catalog`: merges an uploaded catalog document.
pub(crate) async fn import_catalog(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    let mode = match query.mode.as_deref() {
        None | Some("add") => ImportMode::Add,
        Some("update") => ImportMode::Update,
        Some("replace") => ImportMode::Replace,
        Some(other) => {
            return Err(ApiError::BadRequest(format!("Unknown import mode \"{other}\"")));
        }
    };
    let text = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("XML body must be UTF-8 text".to_string()))?;
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("No XML document supplied".to_string()));
    }
    let incoming = run_blocking(|| state.catalog.parse_books(text)).map_err(|err| match err {
        DocError::Parse(parse) => ApiError::BadRequest(format!("Malformed XML: {parse}")),
        other => ApiError::from(other),
    })?;
    let count =
        run_blocking(|| state.catalog.mutate(|books| Ok(apply_import(books, incoming, mode))))?;
    state.audit.record(&AuditEvent::new(
        AuditScope::Catalog,
        AuditOperation::Import,
        None,
        DEFAULT_ACTOR,
        format!("Imported {count} books (mode: {})", mode.as_str()),
    ));
    Ok(Json(ImportResponse {
        success: true,
        message: "Catalog imported",
        count,
    }))
}

/// Merges incoming books into the stored collection, returning how many
/// the merge applied.
fn apply_import(books: &mut Vec<Book>, incoming: Vec<Book>, mode: ImportMode) -> usize {
    match mode {
        ImportMode::Replace => {
            let count = incoming.len();
            *books = incoming;
            count
        }
        ImportMode::Add => {
            let mut added = 0;
            for book in incoming {
                if !books.iter().any(|existing| existing.id == book.id) {
                    books.push(book);
                    added += 1;
                }
            }
            added
        }
        ImportMode::Update => {
            let count = incoming.len();
            for book in incoming {
                if let Some(existing) =
                    books.iter_mut().find(|existing| existing.id == book.id)
                {
                    *existing = book;
                } else {
                    books.push(book);
                }
            }
            count
        }
    }
}

// ============================================================================
// SECTION: Validation and Change Log Handlers
// ============================================================================

/// `POST /validate/catalog`: validates the stored catalog with a verdict.
pub(crate) async fn validate_catalog(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<VerdictResponse>, ApiError> {
    let errors = run_blocking(|| state.catalog.validate_stored())?;
    let valid = errors.is_empty();
    Ok(Json(VerdictResponse {
        success: true,
        valid,
        errors,
        message: if valid { "Catalog is valid" } else { "Catalog has violations" },
    }))
}

/// `POST /validate/orders`: validates the stored orders with a verdict.
pub(crate) async fn validate_orders(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<VerdictResponse>, ApiError> {
    let errors = run_blocking(|| state.orders.validate_stored())?;
    let valid = errors.is_empty();
    Ok(Json(VerdictResponse {
        success: true,
        valid,
        errors,
        message: if valid { "Orders are valid" } else { "Orders have violations" },
    }))
}

/// `GET /changes`: change-log entries, newest first.
pub(crate) async fn list_changes(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<ChangesResponse>, ApiError> {
    let changes = run_blocking(|| match query.entity.as_deref() {
        Some(entity) => state.store.change_logs_for_entity(entity),
        None => state.store.change_logs(query.limit),
    })?;
    Ok(Json(ChangesResponse {
        success: true,
        count: changes.len(),
        changes,
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Wraps a document as an `application/xml` download.
fn attachment(file_name: &str, body: String) -> XmlResponse {
    (
        [
            (header::CONTENT_TYPE, "application/xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
}

/// Wraps schema or stylesheet text as inline `application/xml`.
fn inline_xml(body: String) -> XmlResponse {
    (
        [
            (header::CONTENT_TYPE, "application/xml".to_string()),
            (header::CONTENT_DISPOSITION, "inline".to_string()),
        ],
        body,
    )
}

/// Accepts only bare stylesheet names: one path component, no traversal.
fn stylesheet_name_ok(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', '\0']) && !name.contains("..")
}
