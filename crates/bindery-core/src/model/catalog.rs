// crates/bindery-core/src/model/catalog.rs
// ============================================================================
// Module: Bindery Catalog Model
// Description: Typed form of catalog.xml book entries.
// Purpose: Carry book records between the document layer and the HTTP surface.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Book`] mirrors one `<book>` element: the `id` and `deleted` attributes
//! plus the fixed child sequence (`title` through optional `image`). Soft
//! deletion keeps the element in the document with `deleted="true"`; listings
//! filter on that flag unless explicitly asked not to.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::BookId;
use crate::model::Money;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Currency assigned to prices when none is supplied.
pub const DEFAULT_CURRENCY: &str = "UAH";

/// Price with its currency attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount with two fraction digits.
    pub amount: Money,
    /// ISO currency code; the shop prices everything in UAH.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Price {
    /// Creates a price in the default currency.
    #[must_use]
    pub fn uah(amount: Money) -> Self {
        Self {
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Serde default for [`Price::currency`].
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// One `<book>` entry in the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Book identifier (`id` attribute).
    pub id: BookId,
    /// Soft-delete flag (`deleted` attribute); absent means `false`.
    #[serde(default)]
    pub deleted: bool,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Free-form category label (the demo data uses fiction, technical,
    /// science, children).
    pub category: String,
    /// Price with currency.
    pub price: Price,
    /// Description text.
    pub description: String,
    /// ISBN as printed, dashes included.
    pub isbn: String,
    /// Publication year.
    pub year: i32,
    /// Units in stock.
    pub stock: u32,
    /// Optional cover image path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
