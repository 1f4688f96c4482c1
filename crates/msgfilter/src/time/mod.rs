//! Parsers for the temporal operators (`olderThan` / `newerThan`).
//!
//! - `duration` - approximate human durations ("5m", "1 day, 3 hours")
//! - `timestamp` - timestamps in the common textual formats

mod duration;
mod timestamp;

pub use duration::{parse_duration, DurationParseError};
pub use timestamp::{parse_timestamp, TimestampParseError};
