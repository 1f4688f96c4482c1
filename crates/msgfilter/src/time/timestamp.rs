//! Timestamp parsing for the temporal operators.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats carrying an explicit numeric offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Formats without a numeric offset; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.fZ",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized timestamp '{0}'")]
pub struct TimestampParseError(pub String);

/// Parse a timestamp in any of the supported textual formats.
///
/// Tried in order: RFC 3339, RFC 2822 (which covers HTTP dates), ISO 8601
/// with a numeric offset, naive date-times (UTC), date-only (midnight UTC)
/// and all-digit strings. Digit strings are read by width: 8 digits as
/// `YYYYMMDD`, 10/13/16/19 digits as Unix epoch seconds, milliseconds,
/// microseconds and nanoseconds. Other widths are rejected.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let input = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(input, format) {
            return Ok(ts.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(ts.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        return parse_digits(input).ok_or_else(|| TimestampParseError(text.to_string()));
    }

    Err(TimestampParseError(text.to_string()))
}

fn parse_digits(digits: &str) -> Option<DateTime<Utc>> {
    if digits.len() == 8 {
        return NaiveDate::parse_from_str(digits, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc());
    }
    let value: i64 = digits.parse().ok()?;
    match digits.len() {
        10 => DateTime::from_timestamp(value, 0),
        13 => DateTime::from_timestamp_millis(value),
        16 => DateTime::from_timestamp_micros(value),
        19 => Some(DateTime::from_timestamp_nanos(value)),
        _ => None,
    }
}
