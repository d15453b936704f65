// crates/bindery-api/src/routes/catalog.rs
// ============================================================================
// Module: Catalog Routes
// Description: CRUD surface of the catalog document.
// Purpose: Validate book payloads, mutate the catalog, and audit each change.
// Dependencies: bindery-core, bindery-xml, axum
// ============================================================================

//! ## Overview
//! Every mutation runs one read-modify-write cycle against the catalog store,
//! so the stored document revalidates against the schema before anything is
//! persisted. Books travel in the `$`/`_` projection on the wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::routing::get;
use axum::routing::patch;
use bindery_core::AuditEvent;
use bindery_core::AuditOperation;
use bindery_core::AuditScope;
use bindery_core::Book;
use bindery_core::BookId;
use bindery_core::Money;
use bindery_core::Price;
use bindery_core::generate_book_id;
use bindery_xml::DocError;
use bindery_xml::book_to_element;
use bindery_xml::element_to_value;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::routes::NumberOrText;
use crate::routes::ValidationResponse;
use crate::routes::present;
use crate::routes::scalar_present;
use crate::server::ServerState;
use crate::server::run_blocking;

/// Audit actor recorded when a request names no manager.
const DEFAULT_ACTOR: &str = "manager";

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the catalog router.
pub(crate) fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/validate/xsd", get(validate_catalog))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/{id}/stock", patch(update_stock))
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Query parameters of the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListQuery {
    /// `true` includes soft-deleted books.
    #[serde(default, rename = "showDeleted")]
    pub(crate) show_deleted: Option<String>,
}

/// Query parameters of the delete endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeleteQuery {
    /// `true` removes the element instead of soft-deleting it.
    #[serde(default)]
    pub(crate) hard: Option<String>,
}

/// JSON body of the create and update endpoints; updates apply only the
/// fields that are present.
#[derive(Debug, Deserialize)]
pub(crate) struct BookPayload {
    /// Book title.
    #[serde(default)]
    title: Option<String>,
    /// Author name.
    #[serde(default)]
    author: Option<String>,
    /// Category; the schema confines it to the four shop categories.
    #[serde(default)]
    category: Option<String>,
    /// Decimal price, as a number or string.
    #[serde(default)]
    price: Option<NumberOrText>,
    /// Description text.
    #[serde(default)]
    description: Option<String>,
    /// ISBN text.
    #[serde(default)]
    isbn: Option<String>,
    /// Publication year.
    #[serde(default)]
    year: Option<NumberOrText>,
    /// Units in stock.
    #[serde(default)]
    stock: Option<NumberOrText>,
    /// Cover image path.
    #[serde(default)]
    image: Option<String>,
    /// Audit actor; defaults to `manager`.
    #[serde(default)]
    manager: Option<String>,
}

/// JSON body of the stock endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct StockPayload {
    /// New stock count; missing or negative values are rejected.
    #[serde(default)]
    stock: Option<NumberOrText>,
    /// Audit actor; defaults to `manager`.
    #[serde(default)]
    manager: Option<String>,
}

/// Listing response.
#[derive(Debug, Serialize)]
pub(crate) struct BookListResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Number of books returned.
    pub(crate) count: usize,
    /// Books in projection form.
    pub(crate) books: Vec<Value>,
}

/// Single-book response, with a message on mutations.
#[derive(Debug, Serialize)]
pub(crate) struct BookResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Mutation outcome; absent on plain reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<&'static str>,
    /// The book in projection form.
    pub(crate) book: Value,
}

/// Response of the delete endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct DeleteResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Which kind of delete ran.
    pub(crate) message: &'static str,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /`: lists books, hiding soft-deleted ones unless asked.
pub(crate) async fn list_books(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookListResponse>, ApiError> {
    let show_deleted = query.show_deleted.as_deref() == Some("true");
    let books = run_blocking(|| state.catalog.load())?;
    let books: Vec<Value> = books
        .iter()
        .filter(|book| show_deleted || !book.deleted)
        .map(project)
        .collect();
    Ok(Json(BookListResponse {
        success: true,
        count: books.len(),
        books,
    }))
}

/// `GET /{id}`: one book in projection form.
pub(crate) async fn get_book(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let books = run_blocking(|| state.catalog.load())?;
    let book = books
        .iter()
        .find(|book| book.id.as_str() == id)
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;
    Ok(Json(BookResponse {
        success: true,
        message: None,
        book: project(book),
    }))
}

/// `POST /`: adds a book with a generated identifier.
pub(crate) async fn create_book(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<BookResponse>, ApiError> {
    let (Some(title), Some(author), Some(category), Some(description), Some(isbn)) = (
        present(payload.title.as_deref()),
        present(payload.author.as_deref()),
        present(payload.category.as_deref()),
        present(payload.description.as_deref()),
        present(payload.isbn.as_deref()),
    ) else {
        return Err(missing_fields());
    };
    let (Some(price), Some(year), Some(stock)) = (
        scalar_present(payload.price.as_ref()),
        scalar_present(payload.year.as_ref()),
        scalar_present(payload.stock.as_ref()),
    ) else {
        return Err(missing_fields());
    };
    let price = parse_price(&price)?;
    let year = parse_year(&year)?;
    let stock = parse_stock(&stock)?;
    let actor = present(payload.manager.as_deref()).unwrap_or(DEFAULT_ACTOR).to_string();
    let image = present(payload.image.as_deref()).map(ToString::to_string);
    let title = title.to_string();
    let author = author.to_string();
    let category = category.to_string();
    let description = description.to_string();
    let isbn = isbn.to_string();
    let book = run_blocking(|| {
        state.catalog.mutate(|books| {
            let taken: Vec<BookId> = books.iter().map(|book| book.id.clone()).collect();
            let id = generate_book_id(&taken).map_err(|err| DocError::Model(err.to_string()))?;
            let book = Book {
                id,
                deleted: false,
                title,
                author,
                category,
                price,
                description,
                isbn,
                year,
                stock,
                image,
            };
            books.push(book.clone());
            Ok(book)
        })
    })?;
    state.audit.record(&AuditEvent::new(
        AuditScope::Catalog,
        AuditOperation::Create,
        Some(book.id.as_str().to_string()),
        actor,
        format!("Added book \"{}\"", book.title),
    ));
    Ok(Json(BookResponse {
        success: true,
        message: Some("Book added"),
        book: project(&book),
    }))
}

/// `PUT /{id}`: applies the fields present in the payload.
pub(crate) async fn update_book(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<BookResponse>, ApiError> {
    let price = payload.price.as_ref().map(|value| parse_price(&value.to_text())).transpose()?;
    let year = payload.year.as_ref().map(|value| parse_year(&value.to_text())).transpose()?;
    let stock = payload.stock.as_ref().map(|value| parse_stock(&value.to_text())).transpose()?;
    let actor = present(payload.manager.as_deref()).unwrap_or(DEFAULT_ACTOR).to_string();
    let update = payload;
    let book = run_blocking(|| {
        state.catalog.mutate(|books| {
            let Some(book) = books.iter_mut().find(|book| book.id.as_str() == id) else {
                return Err(DocError::NotFound);
            };
            if let Some(title) = update.title {
                book.title = title;
            }
            if let Some(author) = update.author {
                book.author = author;
            }
            if let Some(category) = update.category {
                book.category = category;
            }
            if let Some(price) = price {
                book.price = price;
            }
            if let Some(description) = update.description {
                book.description = description;
            }
            if let Some(isbn) = update.isbn {
                book.isbn = isbn;
            }
            if let Some(year) = year {
                book.year = year;
            }
            if let Some(stock) = stock {
                book.stock = stock;
            }
            if let Some(image) = update.image {
                book.image = Some(image);
            }
            Ok(book.clone())
        })
    })
    .map_err(or_book_404)?;
    state.audit.record(&AuditEvent::new(
        AuditScope::Catalog,
        AuditOperation::Update,
        Some(id),
        actor,
        format!("Updated book \"{}\"", book.title),
    ));
    Ok(Json(BookResponse {
        success: true,
        message: Some("Book updated"),
        book: project(&book),
    }))
}

/// `DELETE /{id}`: soft delete by default, removal with `?hard=true`.
pub(crate) async fn delete_book(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let hard = query.hard.as_deref() == Some("true");
    let title = run_blocking(|| {
        state.catalog.mutate(|books| {
            if hard {
                let Some(index) = books.iter().position(|book| book.id.as_str() == id) else {
                    return Err(DocError::NotFound);
                };
                Ok(books.remove(index).title)
            } else {
                let Some(book) = books.iter_mut().find(|book| book.id.as_str() == id) else {
                    return Err(DocError::NotFound);
                };
                book.deleted = true;
                Ok(book.title.clone())
            }
        })
    })
    .map_err(or_book_404)?;
    let (operation, message, description) = if hard {
        (
            AuditOperation::HardDelete,
            "Book removed from catalog",
            format!("Removed book \"{title}\""),
        )
    } else {
        (
            AuditOperation::SoftDelete,
            "Book marked as deleted",
            format!("Marked book \"{title}\" as deleted"),
        )
    };
    state.audit.record(&AuditEvent::new(
        AuditScope::Catalog,
        operation,
        Some(id),
        DEFAULT_ACTOR,
        description,
    ));
    Ok(Json(DeleteResponse {
        success: true,
        message,
    }))
}

/// `PATCH /{id}/stock`: sets the stock count.
pub(crate) async fn update_stock(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(payload): Json<StockPayload>,
) -> Result<Json<BookResponse>, ApiError> {
    let stock = parse_stock(&scalar_present(payload.stock.as_ref()).unwrap_or_default())?;
    let actor = present(payload.manager.as_deref()).unwrap_or(DEFAULT_ACTOR).to_string();
    let book = run_blocking(|| {
        state.catalog.mutate(|books| {
            let Some(book) = books.iter_mut().find(|book| book.id.as_str() == id) else {
                return Err(DocError::NotFound);
            };
            book.stock = stock;
            Ok(book.clone())
        })
    })
    .map_err(or_book_404)?;
    state.audit.record(&AuditEvent::new(
        AuditScope::Catalog,
        AuditOperation::UpdateStock,
        Some(id),
        actor,
        format!("Stock set to {stock}"),
    ));
    Ok(Json(BookResponse {
        success: true,
        message: Some("Stock updated"),
        book: project(&book),
    }))
}

/// `GET /validate/xsd`: validates the stored catalog document.
pub(crate) async fn validate_catalog(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let errors = run_blocking(|| state.catalog.validate_stored())?;
    Ok(Json(ValidationResponse {
        success: true,
        valid: errors.is_empty(),
        errors,
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders one book in projection form.
fn project(book: &Book) -> Value {
    element_to_value(&book_to_element(book))
}

/// Maps the store's not-found marker onto this router's 404 message.
fn or_book_404(err: DocError) -> ApiError {
    match err {
        DocError::NotFound => ApiError::NotFound("Book not found".to_string()),
        other => other.into(),
    }
}

/// The shared missing-required-fields rejection.
fn missing_fields() -> ApiError {
    ApiError::BadRequest("Missing required fields".to_string())
}

/// Parses a decimal price into the fixed shop currency.
fn parse_price(text: &str) -> Result<Price, ApiError> {
    let amount = Money::parse(text)
        .map_err(|_| ApiError::BadRequest("Invalid price value".to_string()))?;
    Ok(Price::uah(amount))
}

/// Parses a publication year.
fn parse_year(text: &str) -> Result<i32, ApiError> {
    text.parse().map_err(|_| ApiError::BadRequest("Invalid year value".to_string()))
}

/// Parses a stock count; negative values fail here.
fn parse_stock(text: &str) -> Result<u32, ApiError> {
    text.parse().map_err(|_| ApiError::BadRequest("Invalid stock value".to_string()))
}
