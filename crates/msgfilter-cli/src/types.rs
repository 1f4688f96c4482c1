//! Report types for `msgfilter check`.

use msgfilter::Decision;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Output format of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

/// Result for a single input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// 1-based line number in the input.
    pub line: usize,
    #[serde(flatten)]
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutcomeResult {
    Decided(Decision),
    Failed { error: String },
}

impl Outcome {
    pub fn decided(line: usize, decision: Decision) -> Self {
        Self {
            line,
            result: OutcomeResult::Decided(decision),
        }
    }

    pub fn failed(line: usize, error: impl Into<String>) -> Self {
        Self {
            line,
            result: OutcomeResult::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.result, OutcomeResult::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.result {
            OutcomeResult::Decided(Decision::Accept) => f.write_str("accept"),
            OutcomeResult::Decided(Decision::Requeue { rule }) => write!(f, "requeue (rule '{rule}')"),
            OutcomeResult::Decided(Decision::Reject { rule }) => write!(f, "reject (rule '{rule}')"),
            OutcomeResult::Failed { error } => write!(f, "error: {error}"),
        }
    }
}

/// Totals over a whole input stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub messages: usize,
    pub accepted: usize,
    pub requeued: usize,
    pub rejected: usize,
    pub errors: usize,
}

impl CheckSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        self.messages += 1;
        match &outcome.result {
            OutcomeResult::Decided(Decision::Accept) => self.accepted += 1,
            OutcomeResult::Decided(Decision::Requeue { .. }) => self.requeued += 1,
            OutcomeResult::Decided(Decision::Reject { .. }) => self.rejected += 1,
            OutcomeResult::Failed { .. } => self.errors += 1,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}
