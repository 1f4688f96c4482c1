//! Library side of the `msgfilter` command-line tool.
//!
//! Reads newline-delimited JSON messages, runs each one through a [`Gate`]
//! and writes one decision per message.
//!
//! # Example
//!
//! ```
//! use msgfilter::GateConfig;
//! use msgfilter_cli::{check_stream, OutputFormat};
//!
//! let gate = GateConfig::from_yaml_str(r#"
//! rules:
//!   - name: kind
//!     filter: {path: $.kind, value: order}
//! "#).unwrap().into_gate();
//!
//! let input = "{\"kind\": \"order\"}\n{\"kind\": \"refund\"}\n";
//! let mut out = Vec::new();
//! let summary = check_stream(&gate, input.as_bytes(), &mut out, OutputFormat::Text).unwrap();
//!
//! assert_eq!(summary.accepted, 1);
//! assert_eq!(summary.rejected, 1);
//! assert_eq!(String::from_utf8(out).unwrap(), "line 1: accept\nline 2: reject (rule 'kind')\n");
//! ```

mod types;

pub use types::{CheckSummary, Outcome, OutcomeResult, OutputFormat};

use anyhow::Context;
use msgfilter::{Filter, Gate};
use serde_json::Value;
use std::io::{BufRead, Write};
use tracing::debug;

/// Decide on every message of a newline-delimited JSON stream.
///
/// Blank lines are skipped. Lines that are not valid JSON and messages whose
/// evaluation fails are reported as errors without stopping the stream.
pub fn check_stream<R: BufRead, W: Write>(
    gate: &Gate,
    input: R,
    out: &mut W,
    format: OutputFormat,
) -> anyhow::Result<CheckSummary> {
    let mut summary = CheckSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read input line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match serde_json::from_str::<Value>(&line) {
            Ok(message) => match gate.decide(&message) {
                Ok(decision) => Outcome::decided(line_no, decision),
                Err(e) => Outcome::failed(line_no, e.to_string()),
            },
            Err(e) => Outcome::failed(line_no, format!("invalid JSON: {e}")),
        };
        debug!("{outcome}");

        summary.record(&outcome);
        match format {
            OutputFormat::Text => writeln!(out, "{outcome}")?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&outcome)?)?,
        }
    }

    Ok(summary)
}

/// Evaluate a single filter document against a single message, both JSON text.
pub fn eval_filter(filter: &str, message: &str) -> anyhow::Result<bool> {
    let filter: Filter = serde_json::from_str(filter).context("invalid filter document")?;
    let message: Value = serde_json::from_str(message).context("invalid message")?;
    Ok(filter.test(&message)?)
}
