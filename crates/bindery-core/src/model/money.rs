// crates/bindery-core/src/model/money.rs
// ============================================================================
// Module: Bindery Money
// Description: Fixed-scale monetary values for prices and order totals.
// Purpose: Keep every stored and rendered amount at exactly two fraction digits.
// Dependencies: bigdecimal, serde
// ============================================================================

//! ## Overview
//! All monetary fields in the documents (`price`, `subtotal`, `total`) carry
//! decimal text with two fraction digits. [`Money`] normalizes to that scale
//! at construction with half-up rounding, so arithmetic and rendering can
//! never drift from the document format. Negative amounts are rejected; the
//! domain has no refunds or credits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::RoundingMode;
use serde::Deserialize;
use serde::Serialize;
use serde::de;

use crate::model::ModelError;

// ============================================================================
// SECTION: Money
// ============================================================================

/// Non-negative monetary amount normalized to two fraction digits.
///
/// # Invariants
/// - The inner decimal always has scale 2; [`fmt::Display`] therefore renders
///   exactly two fraction digits.
/// - Amounts are never negative.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(BigDecimal);

impl Money {
    /// Normalizes a decimal to scale 2 with half-up rounding.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMoney`] for negative amounts.
    pub fn new(amount: BigDecimal) -> Result<Self, ModelError> {
        if amount < BigDecimal::from(0) {
            return Err(ModelError::InvalidMoney(amount.to_string()));
        }
        Ok(Self(amount.with_scale_round(2, RoundingMode::HalfUp)))
    }

    /// Parses a decimal string such as `"299.00"` or `"299"`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMoney`] for unparsable or negative input.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        let amount = BigDecimal::from_str(trimmed)
            .map_err(|_| ModelError::InvalidMoney(raw.to_string()))?;
        Self::new(amount)
    }

    /// Returns the zero amount.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::from(0).with_scale(2))
    }

    /// Multiplies the amount by an item quantity, rounding half-up to scale 2.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        let product = &self.0 * BigDecimal::from(quantity);
        Self(product.with_scale_round(2, RoundingMode::HalfUp))
    }

    /// Adds two amounts.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self((&self.0 + &other.0).with_scale(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Visitor accepting monetary input as a string or a JSON number.
struct MoneyVisitor;

impl de::Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a non-negative decimal string or number")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Money::parse(value).map_err(E::custom)
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let amount =
            BigDecimal::try_from(value).map_err(|_| E::custom("non-finite money value"))?;
        Money::new(amount).map_err(E::custom)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Money::new(BigDecimal::from(value)).map_err(E::custom)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Money::new(BigDecimal::from(value)).map_err(E::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
