//! Error types surfaced by filter evaluation.

use crate::predicate::Operator;
use crate::scripting::ScriptError;
use crate::template::TemplateError;
use crate::time::{DurationParseError, TimestampParseError};

/// Everything that can abort the evaluation of a filter tree.
///
/// A missing path is never an error: it resolves to `null` and each operator
/// applies its own null policy.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Operand shape does not fit the operator (e.g. non-list `in` literal).
    #[error("type mismatch for `{operator}`: expected {expected}, found {found}")]
    TypeMismatch {
        operator: Operator,
        expected: &'static str,
        found: String,
    },

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("invalid duration: {0}")]
    Duration(#[from] DurationParseError),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] TimestampParseError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

impl FilterError {
    pub(crate) fn type_mismatch(
        operator: Operator,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        FilterError::TypeMismatch {
            operator,
            expected,
            found: found.into(),
        }
    }
}

/// Errors raised by a [`Gate`](crate::gate::Gate) while deciding on a message.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("rule '{rule}' failed: {source}")]
    Rule {
        rule: String,
        #[source]
        source: FilterError,
    },
}
