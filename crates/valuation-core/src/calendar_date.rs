//! Calendar-date handling for wire timestamps.
//!
//! The backend emits either plain `YYYY-MM-DD` dates or full ISO timestamps
//! (`2023-01-01T00:00:00`). Series are keyed by calendar day, so any time
//! component is truncated before parsing.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{DashboardError, DashboardResult};

pub const FORMAT: &str = "%Y-%m-%d";

/// Parse a date or date-time string into its calendar date.
pub fn parse(raw: &str) -> DashboardResult<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);

    NaiveDate::parse_from_str(day, FORMAT)
        .map_err(|e| DashboardError::InvalidInput(format!("bad date '{}': {}", raw, e)))
}

pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format(FORMAT).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
