// crates/bindery-core/src/model/time.rs
// ============================================================================
// Module: Bindery Time Model
// Description: RFC 3339 timestamps for orders, status history, and audit events.
// Purpose: Provide one canonical wall-clock representation across documents and logs.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every dated value in the system (order date, status change, audit event)
//! is an RFC 3339 UTC instant with millisecond precision. [`Timestamp`] wraps
//! [`time::OffsetDateTime`] and fixes the wire form in one place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::ModelError;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// RFC 3339 UTC instant with millisecond precision.
///
/// # Invariants
/// - Values constructed through [`Timestamp::now`] or [`Timestamp::parse`]
///   always format successfully as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current instant truncated to whole milliseconds.
    #[must_use]
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        let truncated = now.replace_nanosecond(now.nanosecond() - now.nanosecond() % 1_000_000);
        Self(truncated.unwrap_or(now))
    }

    /// Parses an RFC 3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTimestamp`] when the input is not RFC 3339.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let parsed = OffsetDateTime::parse(raw, &Rfc3339)
            .map_err(|_| ModelError::InvalidTimestamp(raw.to_string()))?;
        Ok(Self(parsed))
    }

    /// Renders the RFC 3339 wire form.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.format(&Rfc3339).unwrap_or_default()
    }

    /// Returns the instant as Unix milliseconds.
    #[must_use]
    pub fn unix_millis(&self) -> i64 {
        i64::try_from(self.0.unix_timestamp_nanos() / 1_000_000).unwrap_or_default()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
