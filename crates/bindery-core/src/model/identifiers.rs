// crates/bindery-core/src/model/identifiers.rs
// ============================================================================
// Module: Bindery Identifiers
// Description: Typed identifiers for books and orders plus generation helpers.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, rand
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings on the wire. Books use
//! `book_<unix-millis>_<suffix>` and orders use `ORD-` followed by six
//! zero-padded digits. Generation draws random suffixes and retries until the
//! candidate is absent from the caller's current document, so a freshly
//! generated identifier never collides with one already stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

use crate::model::ModelError;
use crate::model::Timestamp;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Book identifier within the catalog document.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a new book identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BookId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Order identifier within the orders document.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new order identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Random probes before falling back to a deterministic sweep.
const GENERATION_ATTEMPTS: usize = 64;

/// Upper bound (exclusive) for the random book suffix.
const BOOK_SUFFIX_SPACE: u32 = 1_000;

/// Upper bound (exclusive) for the random order number.
const ORDER_NUMBER_SPACE: u32 = 10_000;

/// Generates a book identifier absent from `taken`.
///
/// # Errors
///
/// Returns [`ModelError::IdSpaceExhausted`] when every suffix for the current
/// millisecond is already taken.
pub fn generate_book_id(taken: &[BookId]) -> Result<BookId, ModelError> {
    let millis = Timestamp::now().unix_millis();
    let mut rng = rand::thread_rng();
    for _ in 0..GENERATION_ATTEMPTS {
        let suffix = rng.gen_range(0..BOOK_SUFFIX_SPACE);
        let candidate = BookId::new(format!("book_{millis}_{suffix}"));
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }
    // Random probing saturated; sweep the suffix space for a free slot.
    for suffix in 0..BOOK_SUFFIX_SPACE {
        let candidate = BookId::new(format!("book_{millis}_{suffix}"));
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ModelError::IdSpaceExhausted("book"))
}

/// Generates an order identifier absent from `taken`.
///
/// # Errors
///
/// Returns [`ModelError::IdSpaceExhausted`] when all ten thousand order
/// numbers are already taken.
pub fn generate_order_id(taken: &[OrderId]) -> Result<OrderId, ModelError> {
    let mut rng = rand::thread_rng();
    for _ in 0..GENERATION_ATTEMPTS {
        let number = rng.gen_range(0..ORDER_NUMBER_SPACE);
        let candidate = OrderId::new(format!("ORD-{number:06}"));
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }
    // Random probing saturated; sweep the number space for a free slot.
    for number in 0..ORDER_NUMBER_SPACE {
        let candidate = OrderId::new(format!("ORD-{number:06}"));
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ModelError::IdSpaceExhausted("order"))
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
    fn book_id_has_expected_shape() {
        let id = generate_book_id(&[]).unwrap();
        let mut parts = id.as_str().splitn(3, '_');
        assert_eq!(parts.next(), Some("book"));
        let millis: i64 = parts.next().unwrap().parse().unwrap();
        assert!(millis > 0, "timestamp component must be positive");
        let suffix: u32 = parts.next().unwrap().parse().unwrap();
        assert!(suffix < BOOK_SUFFIX_SPACE, "suffix must stay in range");
    }

    #[test]
    fn order_id_is_zero_padded() {
        let id = generate_order_id(&[]).unwrap();
        assert!(id.as_str().starts_with("ORD-"), "prefix must be ORD-");
        let digits = &id.as_str()[4..];
        assert_eq!(digits.len(), 6, "order number must be six digits");
        assert!(digits.chars().all(|c| c.is_ascii_digit()), "order number must be numeric");
    }

    #[test]
    fn order_generation_avoids_taken_ids() {
        let taken: Vec<OrderId> =
            (0..ORDER_NUMBER_SPACE - 1).map(|n| OrderId::new(format!("ORD-{n:06}"))).collect();
        let id = generate_order_id(&taken).unwrap();
        assert!(!taken.contains(&id), "generated id must not collide");
    }

    #[test]
    fn order_generation_reports_exhaustion() {
        let taken: Vec<OrderId> =
            (0..ORDER_NUMBER_SPACE).map(|n| OrderId::new(format!("ORD-{n:06}"))).collect();
        let err = generate_order_id(&taken).unwrap_err();
        assert_eq!(err, ModelError::IdSpaceExhausted("order"));
    }
}
