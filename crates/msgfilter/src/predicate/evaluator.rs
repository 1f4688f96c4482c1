//! Evaluation of filter trees against messages.

use super::normalize::{kind_name, normalize, to_f64};
use super::{Filter, Matcher, Operator};
use crate::error::FilterError;
use crate::scripting::Interpreters;
use crate::template::{interpolate, Functions};
use crate::time::{parse_duration, parse_timestamp};
use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::trace;

/// Evaluates filters with a fixed set of template functions and script
/// interpreters.
///
/// An evaluator holds no per-message state and can be shared freely between
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    functions: Functions,
    interpreters: Interpreters,
}

impl Evaluator {
    pub fn new(functions: Functions, interpreters: Interpreters) -> Self {
        Self {
            functions,
            interpreters,
        }
    }

    /// Process-wide evaluator with the built-in functions and interpreters.
    pub fn shared() -> &'static Evaluator {
        static SHARED: OnceLock<Evaluator> = OnceLock::new();
        SHARED.get_or_init(Evaluator::default)
    }

    pub fn functions(&self) -> &Functions {
        &self.functions
    }

    pub fn interpreters(&self) -> &Interpreters {
        &self.interpreters
    }

    /// Evaluate `filter` against `message`, following `or` on failure and
    /// `and` on success.
    pub fn test(&self, filter: &Filter, message: &Value) -> Result<bool, FilterError> {
        let passed = self.test_node(&filter.matcher, message)?;
        trace!("Filter node {} -> {}", describe(&filter.matcher), passed);

        match (passed, &filter.or, &filter.and) {
            (false, Some(or), _) => self.test(or, message),
            (true, _, Some(and)) => self.test(and, message),
            _ => Ok(passed),
        }
    }

    fn test_node(&self, matcher: &Matcher, message: &Value) -> Result<bool, FilterError> {
        match matcher {
            Matcher::Script(script) => Ok(script.evaluate(message, &self.interpreters)?),
            Matcher::Path {
                path,
                value,
                operator,
            } => self.compare(*operator, path.resolve(message), value, message),
            Matcher::Template {
                template,
                value,
                operator,
            } => {
                let subject = Value::String(template.render(message, &self.functions)?);
                self.compare(*operator, subject, value, message)
            }
        }
    }

    /// Resolve the comparison side: numbers are normalized, strings are
    /// interpolated against the message, everything else is used verbatim.
    fn resolve_literal(
        &self,
        literal: &Value,
        operator: Operator,
        message: &Value,
    ) -> Result<Value, FilterError> {
        match literal {
            Value::Number(_) => normalize(literal.clone(), operator),
            Value::String(source) => Ok(Value::String(interpolate(
                source,
                message,
                &self.functions,
            )?)),
            other => Ok(other.clone()),
        }
    }

    fn compare(
        &self,
        operator: Operator,
        subject: Value,
        literal: &Value,
        message: &Value,
    ) -> Result<bool, FilterError> {
        match operator {
            Operator::Equal | Operator::NotEqual => {
                let expected = self.resolve_literal(literal, operator, message)?;
                let equal = expected == normalize(subject, operator)?;
                Ok(equal == (operator == Operator::Equal))
            }
            Operator::In | Operator::NotIn => {
                let Value::Array(candidates) = literal else {
                    return Err(FilterError::type_mismatch(operator, "list", kind_name(literal)));
                };
                let subject = normalize(subject, operator)?;
                let mut found = false;
                for candidate in candidates {
                    if self.resolve_literal(candidate, operator, message)? == subject {
                        found = true;
                        break;
                    }
                }
                Ok(found == (operator == Operator::In))
            }
            Operator::LessThan
            | Operator::GreaterThan
            | Operator::LessOrEqual
            | Operator::GreaterOrEqual => {
                if subject.is_null() {
                    return Ok(false);
                }
                let expected = to_f64(&self.resolve_literal(literal, operator, message)?, operator)?;
                let actual = to_f64(&subject, operator)?;
                Ok(match operator {
                    Operator::LessThan => actual < expected,
                    Operator::GreaterThan => actual > expected,
                    Operator::LessOrEqual => actual <= expected,
                    _ => actual >= expected,
                })
            }
            Operator::OlderThan | Operator::NewerThan => {
                if subject.is_null() {
                    return Ok(false);
                }
                let Value::String(duration) = self.resolve_literal(literal, operator, message)?
                else {
                    return Err(FilterError::type_mismatch(
                        operator,
                        "duration string",
                        kind_name(literal),
                    ));
                };
                let Value::String(timestamp) = &subject else {
                    return Err(FilterError::type_mismatch(
                        operator,
                        "timestamp string",
                        kind_name(&subject),
                    ));
                };
                let duration = parse_duration(&duration)?;
                let elapsed = Utc::now().signed_duration_since(parse_timestamp(timestamp)?);
                Ok(match operator {
                    Operator::OlderThan => elapsed > duration,
                    _ => elapsed < duration,
                })
            }
            Operator::RegexMatch | Operator::RegexNoMatch => {
                let Value::String(pattern) = self.resolve_literal(literal, operator, message)?
                else {
                    return Err(FilterError::type_mismatch(
                        operator,
                        "pattern string",
                        kind_name(literal),
                    ));
                };
                let pattern = Regex::new(&pattern)?;
                let Value::String(text) = &subject else {
                    return Err(FilterError::type_mismatch(
                        operator,
                        "string",
                        kind_name(&subject),
                    ));
                };
                Ok(pattern.is_match(text) == (operator == Operator::RegexMatch))
            }
        }
    }
}

fn describe(matcher: &Matcher) -> String {
    match matcher {
        Matcher::Path { path, operator, .. } => format!("path {path} {operator}"),
        Matcher::Template {
            template, operator, ..
        } => format!("template {:?} {operator}", template.as_str()),
        Matcher::Script(script) => format!("script ({})", script.interpreter),
    }
}
