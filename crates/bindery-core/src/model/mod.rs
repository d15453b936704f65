// crates/bindery-core/src/model/mod.rs
// ============================================================================
// Module: Bindery Domain Model
// Description: Typed catalog and order model plus shared value types.
// Purpose: Group model submodules and expose the model error type.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The model mirrors the two XML documents: `catalog.xml` holds [`Book`]
//! entries and `orders.xml` holds [`Order`] entries. Value types ([`Money`],
//! [`Timestamp`], the identifier newtypes) enforce the wire forms at
//! construction so the rest of the system never re-parses them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod identifiers;
pub mod money;
pub mod orders;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::Book;
pub use catalog::DEFAULT_CURRENCY;
pub use catalog::Price;
pub use identifiers::BookId;
pub use identifiers::OrderId;
pub use identifiers::generate_book_id;
pub use identifiers::generate_order_id;
pub use money::Money;
pub use orders::Customer;
pub use orders::Order;
pub use orders::OrderItem;
pub use orders::OrderStatus;
pub use orders::StatusChange;
pub use time::Timestamp;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when model values are built from wire or document input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Monetary value failed to parse or was negative.
    #[error("invalid money value: {0}")]
    InvalidMoney(String),
    /// Timestamp was not valid RFC 3339.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Order status string is not one of the known values.
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
    /// Numeric field failed to parse.
    #[error("invalid {field} value: {value}")]
    InvalidNumber {
        /// Field name as it appears in the document.
        field: &'static str,
        /// Rejected raw value.
        value: String,
    },
    /// Identifier generation exhausted its retry budget.
    #[error("identifier space exhausted for {0}")]
    IdSpaceExhausted(&'static str),
}
