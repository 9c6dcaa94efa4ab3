//! # Timestamp normalization
//!
//! Congestion sources stamp their samples in a loose `YYYY/M/D H:mm` form,
//! while lookups always go through the zero-padded `YYYY-MM-DD HH:mm` form.
//! Everything is truncated to minute granularity.

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

/// The canonical lookup format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats accepted on input, tried in order.
///
/// chrono's numeric fields accept one or two digits,
/// so these also cover unpadded months, days and hours.
const ACCEPTED_FORMATS: [&str; 4] = [
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Unrecognized timestamp {0:?}; expected YYYY-MM-DD HH:mm or YYYY/M/D H:mm")]
    Unrecognized(String),
}

/// Parses a source or canonical timestamp, truncated to the minute.
///
/// # Errors
///
/// Fails if the input matches none of the accepted formats,
/// or if it names an impossible date.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = input.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(truncate_to_minute)
        .ok_or_else(|| TimestampError::Unrecognized(input.to_string()))
}

/// Renders a timestamp in the canonical `YYYY-MM-DD HH:mm` form.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Converts e.g. `2019/9/1 0:00` into `2019-09-01 00:00`.
///
/// # Errors
///
/// See [`parse_timestamp`].
pub fn normalize_timestamp(input: &str) -> Result<String, TimestampError> {
    parse_timestamp(input).map(|timestamp| format_timestamp(&timestamp))
}

/// Drops seconds and sub-second precision.
pub fn truncate_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    // Zero is always a valid second and nanosecond, so this never falls back
    timestamp
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}
