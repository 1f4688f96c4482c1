//! Approximate duration parsing.
//!
//! Accepts one or more `<number><unit>` terms, e.g. `5m`, `1h30m`, `1.5 hours`,
//! `2 days, 3 hours` or `1 week and 2 days`. Months count as 30 days and years
//! as 365 days.

use chrono::TimeDelta;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
const NANOS_PER_DAY: f64 = 86_400.0 * NANOS_PER_SECOND;

/// Error returned when a duration literal cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,
    #[error("expected a number at '{0}'")]
    MissingNumber(String),
    #[error("missing unit after '{0}'")]
    MissingUnit(String),
    #[error("unknown duration unit '{0}'")]
    UnknownUnit(String),
    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
}

/// Parse an approximate, possibly compound, human duration.
pub fn parse_duration(text: &str) -> Result<TimeDelta, DurationParseError> {
    let input = text.trim();
    if input.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if input == "0" {
        return Ok(TimeDelta::zero());
    }

    let mut total_nanos = 0.0_f64;
    let mut rest = skip_separators(input);

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(DurationParseError::MissingNumber(rest.to_string()));
        }
        let (number, tail) = rest.split_at(number_len);
        let amount: f64 = number
            .parse()
            .map_err(|_| DurationParseError::MissingNumber(number.to_string()))?;

        let tail = tail.trim_start();
        let unit_len = tail
            .find(|c: char| !c.is_alphabetic())
            .unwrap_or(tail.len());
        if unit_len == 0 {
            return Err(DurationParseError::MissingUnit(number.to_string()));
        }
        let (unit, after) = tail.split_at(unit_len);

        total_nanos += amount * unit_nanos(unit)?;
        rest = skip_separators(after);
    }

    if !total_nanos.is_finite() || total_nanos >= i64::MAX as f64 {
        return Err(DurationParseError::OutOfRange(input.to_string()));
    }
    Ok(TimeDelta::nanoseconds(total_nanos.round() as i64))
}

/// Skip whitespace, commas and a joining "and" between terms.
fn skip_separators(mut s: &str) -> &str {
    loop {
        s = s.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        match s.strip_prefix("and") {
            Some(after) if after.starts_with(|c: char| c.is_whitespace() || c.is_ascii_digit()) => {
                s = after;
            }
            _ => return s,
        }
    }
}

fn unit_nanos(unit: &str) -> Result<f64, DurationParseError> {
    let nanos = match unit.to_lowercase().as_str() {
        "ns" | "nanosecond" | "nanoseconds" => 1.0,
        "us" | "µs" | "μs" | "microsecond" | "microseconds" => 1_000.0,
        "ms" | "millisecond" | "milliseconds" => 1_000_000.0,
        "s" | "sec" | "secs" | "second" | "seconds" => NANOS_PER_SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0 * NANOS_PER_SECOND,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600.0 * NANOS_PER_SECOND,
        "d" | "day" | "days" => NANOS_PER_DAY,
        "w" | "wk" | "wks" | "week" | "weeks" => 7.0 * NANOS_PER_DAY,
        "mo" | "mon" | "month" | "months" => 30.0 * NANOS_PER_DAY,
        "y" | "yr" | "yrs" | "year" | "years" => 365.0 * NANOS_PER_DAY,
        _ => return Err(DurationParseError::UnknownUnit(unit.to_string())),
    };
    Ok(nanos)
}
