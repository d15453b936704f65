// crates/bindery-core/src/model/orders.rs
// ============================================================================
// Module: Bindery Orders Model
// Description: Typed form of orders.xml order entries.
// Purpose: Carry orders, line items, and status history with computed totals.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Order`] mirrors one `<order>` element: identifier, placement date, and
//! current status as attributes; customer, line items, total, status history,
//! and notes as children. Totals are always recomputed from line items when an
//! order is assembled, and every status transition appends to the history
//! rather than overwriting it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::model::BookId;
use crate::model::ModelError;
use crate::model::Money;
use crate::model::OrderId;
use crate::model::Timestamp;

// ============================================================================
// SECTION: Status
// ============================================================================

/// Lifecycle status of an order.
///
/// # Invariants
/// - The wire form is the lowercase variant name; unknown strings are rejected
///   at the edge and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Freshly placed, not yet picked up by a manager.
    #[default]
    New,
    /// Accepted and being prepared.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Delivered and closed.
    Completed,
}

impl OrderStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 4] = [Self::New, Self::Processing, Self::Shipped, Self::Completed];

    /// Returns the wire string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ModelError::UnknownStatus(value.to_string()))
    }
}

// ============================================================================
// SECTION: Order Types
// ============================================================================

/// Customer contact details attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer name.
    #[serde(default)]
    pub name: String,
    /// Contact email; the only field the shop requires.
    pub email: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Delivery city.
    #[serde(default)]
    pub city: String,
    /// Delivery address.
    #[serde(default)]
    pub address: String,
}

/// One `<item>` line within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Referenced book (`book_id` attribute).
    pub book_id: BookId,
    /// Quantity ordered (`quantity` attribute).
    pub quantity: u32,
    /// Book title as offered at order time.
    pub title: String,
    /// Unit price at order time.
    pub price: Money,
    /// `price × quantity`, rounded half-up to two digits.
    pub subtotal: Money,
}

impl OrderItem {
    /// Builds a line item, computing the subtotal from price and quantity.
    #[must_use]
    pub fn new(book_id: BookId, quantity: u32, title: impl Into<String>, price: Money) -> Self {
        let subtotal = price.times(quantity);
        Self {
            book_id,
            quantity,
            title: title.into(),
            price,
            subtotal,
        }
    }
}

/// One `<statusChange>` entry in an order's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// When the transition happened.
    pub date: Timestamp,
    /// Status entered by the transition.
    pub status: OrderStatus,
    /// Free-form comment describing the transition.
    pub comment: String,
}

/// One `<order>` entry in the orders document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier (`id` attribute).
    pub id: OrderId,
    /// Placement instant (`date` attribute).
    pub date: Timestamp,
    /// Current status (`status` attribute).
    pub status: OrderStatus,
    /// Customer details.
    pub customer: Customer,
    /// Line items; never empty for a stored order.
    pub items: Vec<OrderItem>,
    /// Sum of line-item subtotals.
    pub total: Money,
    /// Status transitions, oldest first.
    pub status_history: Vec<StatusChange>,
    /// Manager notes; empty when none.
    #[serde(default)]
    pub notes: String,
}

impl Order {
    /// Sums line-item subtotals into an order total.
    #[must_use]
    pub fn total_of(items: &[OrderItem]) -> Money {
        items.iter().fold(Money::zero(), |acc, item| acc.plus(&item.subtotal))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
