// crates/bindery-api/src/routes/orders.rs
// ============================================================================
// Module: Order Routes
// Description: Order placement and lifecycle surface of the orders document.
// Purpose: Compute totals server-side, track status history, audit changes.
// Dependencies: bindery-core, bindery-xml, bindery-store-sqlite, axum
// ============================================================================

//! ## Overview
//! Orders are placed by customers and advanced by managers. Placement
//! recomputes every subtotal and the order total from the submitted prices,
//! never trusting client arithmetic, and upserts the customer's session
//! profile in the side store. Status changes append to the order's history;
//! the history is never rewritten.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;
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
use bindery_core::BookId;
use bindery_core::Customer;
use bindery_core::Money;
use bindery_core::Order;
use bindery_core::OrderId;
use bindery_core::OrderItem;
use bindery_core::OrderStatus;
use bindery_core::StatusChange;
use bindery_core::Timestamp;
use bindery_core::generate_order_id;
use bindery_xml::DocError;
use bindery_xml::element_to_value;
use bindery_xml::order_to_element;
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

/// Builds the orders router.
pub(crate) fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/validate/xsd", get(validate_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/notes", patch(update_notes))
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Query parameters of the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListQuery {
    /// Filters orders by the customer email.
    #[serde(default)]
    pub(crate) email: Option<String>,
}

/// JSON body of the placement endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct OrderPayload {
    /// Customer contact block.
    #[serde(default)]
    customer: Option<CustomerPayload>,
    /// Ordered lines; must not be empty.
    #[serde(default)]
    items: Option<Vec<ItemPayload>>,
    /// Free-form customer notes.
    #[serde(default)]
    notes: Option<String>,
}

/// Customer block of the placement payload.
#[derive(Debug, Deserialize)]
pub(crate) struct CustomerPayload {
    /// Customer name.
    #[serde(default)]
    name: Option<String>,
    /// Contact email; required.
    #[serde(default)]
    email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    phone: Option<String>,
    /// Delivery city.
    #[serde(default)]
    city: Option<String>,
    /// Delivery address.
    #[serde(default)]
    address: Option<String>,
}

/// One line of the placement payload.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemPayload {
    /// Referenced book; both spellings are accepted.
    #[serde(default, alias = "bookId")]
    book_id: Option<String>,
    /// Title as offered.
    #[serde(default)]
    title: Option<String>,
    /// Quantity; must be at least one.
    #[serde(default)]
    quantity: Option<NumberOrText>,
    /// Unit price, as a number or string.
    #[serde(default)]
    price: Option<NumberOrText>,
}

/// JSON body of the status endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    /// Target status wire name.
    #[serde(default)]
    status: Option<String>,
    /// History comment; defaults to the standard transition line.
    #[serde(default)]
    comment: Option<String>,
    /// Audit actor; defaults to `manager`.
    #[serde(default)]
    manager: Option<String>,
}

/// JSON body of the notes endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct NotesPayload {
    /// Replacement notes; missing clears them.
    #[serde(default)]
    notes: Option<String>,
    /// Audit actor; defaults to `manager`.
    #[serde(default)]
    manager: Option<String>,
}

/// Listing response.
#[derive(Debug, Serialize)]
pub(crate) struct OrderListResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Number of orders returned.
    pub(crate) count: usize,
    /// Orders in projection form.
    pub(crate) orders: Vec<Value>,
}

/// Single-order response, with a message on mutations.
#[derive(Debug, Serialize)]
pub(crate) struct OrderResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Mutation outcome; absent on plain reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<&'static str>,
    /// The order in projection form.
    pub(crate) order: Value,
}

/// Placement receipt; mirrors what a checkout page renders.
#[derive(Debug, Serialize)]
pub(crate) struct PlacedOrder {
    /// Order identifier.
    pub(crate) id: String,
    /// Same identifier under the name receipts print.
    #[serde(rename = "orderNumber")]
    pub(crate) order_number: String,
    /// Placement instant (RFC 3339).
    pub(crate) date: String,
    /// Initial status wire name.
    pub(crate) status: &'static str,
    /// Customer details as stored.
    pub(crate) customer: Customer,
    /// Lines with server-computed subtotals.
    pub(crate) items: Vec<OrderItem>,
    /// Order total.
    pub(crate) total: String,
    /// Same total under the name receipts print.
    #[serde(rename = "totalPrice")]
    pub(crate) total_price: String,
}

/// Placement response.
#[derive(Debug, Serialize)]
pub(crate) struct PlaceOrderResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Placement outcome.
    pub(crate) message: &'static str,
    /// Receipt for the new order.
    pub(crate) order: PlacedOrder,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /`: lists orders, optionally filtered by customer email.
pub(crate) async fn list_orders(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = run_blocking(|| state.orders.load())?;
    let orders: Vec<Value> = orders
        .iter()
        .filter(|order| {
            query.email.as_deref().is_none_or(|email| order.customer.email == email)
        })
        .map(project)
        .collect();
    Ok(Json(OrderListResponse {
        success: true,
        count: orders.len(),
        orders,
    }))
}

/// `GET /{id}`: one order in projection form.
pub(crate) async fn get_order(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let orders = run_blocking(|| state.orders.load())?;
    let order = orders
        .iter()
        .find(|order| order.id.as_str() == id)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;
    Ok(Json(OrderResponse {
        success: true,
        message: None,
        order: project(order),
    }))
}

/// `POST /`: places an order with server-computed totals.
pub(crate) async fn create_order(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<OrderPayload>,
) -> Result<Json<PlaceOrderResponse>, ApiError> {
    let Some(customer) = payload.customer else {
        return Err(incomplete());
    };
    let (Some(name), Some(email)) =
        (present(customer.name.as_deref()), present(customer.email.as_deref()))
    else {
        return Err(incomplete());
    };
    let customer = Customer {
        name: name.to_string(),
        email: email.to_string(),
        phone: present(customer.phone.as_deref()).unwrap_or_default().to_string(),
        city: present(customer.city.as_deref()).unwrap_or_default().to_string(),
        address: present(customer.address.as_deref()).unwrap_or_default().to_string(),
    };
    let items = build_items(payload.items.unwrap_or_default()).ok_or_else(incomplete)?;
    let total = Order::total_of(&items);
    let notes = payload.notes.unwrap_or_default();
    let stored_customer = customer.clone();
    let order = run_blocking(|| {
        state.orders.mutate(|orders| {
            let taken: Vec<OrderId> = orders.iter().map(|order| order.id.clone()).collect();
            let id = generate_order_id(&taken).map_err(|err| DocError::Model(err.to_string()))?;
            let now = Timestamp::now();
            let order = Order {
                id,
                date: now,
                status: OrderStatus::New,
                customer: stored_customer,
                items,
                total,
                status_history: vec![StatusChange {
                    date: now,
                    status: OrderStatus::New,
                    comment: "Order placed by customer".to_string(),
                }],
                notes,
            };
            orders.push(order.clone());
            Ok(order)
        })
    })?;
    // The profile upsert is advisory; the placed order must not fail on it.
    drop(run_blocking(|| {
        state.store.update_client_info(
            &customer.email,
            &customer.name,
            &customer.phone,
            &customer.city,
            &customer.address,
        )
    }));
    state.audit.record(&AuditEvent::new(
        AuditScope::Orders,
        AuditOperation::Create,
        Some(order.id.as_str().to_string()),
        customer.email.clone(),
        format!("New order for {} UAH", order.total),
    ));
    Ok(Json(PlaceOrderResponse {
        success: true,
        message: "Order placed",
        order: receipt(&order),
    }))
}

/// `PATCH /{id}/status`: advances the status and appends to the history.
pub(crate) async fn update_status(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Some(status) = present(payload.status.as_deref()) else {
        return Err(ApiError::BadRequest("Status is required".to_string()));
    };
    let status = OrderStatus::from_str(status).map_err(ApiError::from)?;
    let comment = present(payload.comment.as_deref())
        .map_or_else(|| format!("Status changed to \"{status}\""), ToString::to_string);
    let actor = present(payload.manager.as_deref()).unwrap_or(DEFAULT_ACTOR).to_string();
    let change_comment = comment.clone();
    let order = run_blocking(|| {
        state.orders.mutate(|orders| {
            let Some(order) = orders.iter_mut().find(|order| order.id.as_str() == id) else {
                return Err(DocError::NotFound);
            };
            order.status = status;
            order.status_history.push(StatusChange {
                date: Timestamp::now(),
                status,
                comment: change_comment,
            });
            Ok(order.clone())
        })
    })
    .map_err(or_order_404)?;
    state.audit.record(&AuditEvent::new(
        AuditScope::Orders,
        AuditOperation::UpdateStatus,
        Some(id),
        actor,
        comment,
    ));
    Ok(Json(OrderResponse {
        success: true,
        message: Some("Order status updated"),
        order: project(&order),
    }))
}

/// `PATCH /{id}/notes`: replaces the manager notes.
pub(crate) async fn update_notes(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(payload): Json<NotesPayload>,
) -> Result<Json<OrderResponse>, ApiError> {
    let notes = payload.notes.unwrap_or_default();
    let actor = present(payload.manager.as_deref()).unwrap_or(DEFAULT_ACTOR).to_string();
    let order = run_blocking(|| {
        state.orders.mutate(|orders| {
            let Some(order) = orders.iter_mut().find(|order| order.id.as_str() == id) else {
                return Err(DocError::NotFound);
            };
            order.notes = notes;
            Ok(order.clone())
        })
    })
    .map_err(or_order_404)?;
    state.audit.record(&AuditEvent::new(
        AuditScope::Orders,
        AuditOperation::UpdateNotes,
        Some(id),
        actor,
        "Order notes updated",
    ));
    Ok(Json(OrderResponse {
        success: true,
        message: Some("Notes updated"),
        order: project(&order),
    }))
}

/// `GET /validate/xsd`: validates the stored orders document.
pub(crate) async fn validate_orders(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let errors = run_blocking(|| state.orders.validate_stored())?;
    Ok(Json(ValidationResponse {
        success: true,
        valid: errors.is_empty(),
        errors,
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders one order in projection form.
fn project(order: &Order) -> Value {
    element_to_value(&order_to_element(order))
}

/// Maps the store's not-found marker onto this router's 404 message.
fn or_order_404(err: DocError) -> ApiError {
    match err {
        DocError::NotFound => ApiError::NotFound("Order not found".to_string()),
        other => other.into(),
    }
}

/// The shared incomplete-order rejection.
fn incomplete() -> ApiError {
    ApiError::BadRequest("Order data is incomplete".to_string())
}

/// Builds typed lines from the payload; `None` marks any invalid line.
fn build_items(raw: Vec<ItemPayload>) -> Option<Vec<OrderItem>> {
    if raw.is_empty() {
        return None;
    }
    let mut items = Vec::with_capacity(raw.len());
    for line in raw {
        let book_id = present(line.book_id.as_deref())?.to_string();
        let quantity: u32 = scalar_present(line.quantity.as_ref())?.parse().ok()?;
        if quantity == 0 {
            return None;
        }
        let price = Money::parse(&scalar_present(line.price.as_ref())?).ok()?;
        let title = present(line.title.as_deref()).unwrap_or_default().to_string();
        items.push(OrderItem::new(BookId::new(book_id), quantity, title, price));
    }
    Some(items)
}

/// Builds the placement receipt from a stored order.
fn receipt(order: &Order) -> PlacedOrder {
    PlacedOrder {
        id: order.id.as_str().to_string(),
        order_number: order.id.as_str().to_string(),
        date: order.date.to_rfc3339(),
        status: order.status.as_str(),
        customer: order.customer.clone(),
        items: order.items.clone(),
        total: order.total.to_string(),
        total_price: order.total.to_string(),
    }
}
