//! Parsing helpers for the weather provider's textual formats
//!
//! The provider reports every timestamp as UTC+8 wall clock with a literal
//! `+08:00` suffix and every measurement as a decimal string. Values that fail
//! to parse come back as `None` so callers can apply their own fallback.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Offset of the provider's wall clock from UTC
pub const PROVIDER_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Suffix the provider appends to every timestamp
pub const PROVIDER_OFFSET_SUFFIX: &str = "+08:00";

const PROVIDER_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Current time on the provider's wall clock
pub fn provider_now() -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::seconds(i64::from(PROVIDER_UTC_OFFSET_SECS))
}

/// Current calendar date on the provider's wall clock
pub fn provider_today() -> NaiveDate {
    provider_now().date()
}

/// Parse a provider timestamp such as `2024-07-01T14:35+08:00`
///
/// The fixed offset suffix is stripped and the remainder read as a naive
/// timestamp. Any other offset is treated as unparseable.
pub fn parse_provider_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let local = trimmed
        .strip_suffix(PROVIDER_OFFSET_SUFFIX)
        .unwrap_or(trimmed);

    PROVIDER_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())
}

/// Parse a provider measurement such as `"31.5"` without going through f64
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// `Some` only for strings with visible content
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}
