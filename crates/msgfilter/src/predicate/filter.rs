//! Filter nodes and their wire format.

use super::{Evaluator, Operator, PathExpr};
use crate::error::FilterError;
use crate::scripting::{Interpreters, ScriptError, ScriptFilter};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a node arrives at its verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Subject is the result of a path query.
    Path {
        path: PathExpr,
        value: Value,
        operator: Operator,
    },
    /// Subject is a template rendered against the message.
    Template {
        template: Template,
        value: Value,
        operator: Operator,
    },
    /// The verdict comes from a script.
    Script(ScriptFilter),
}

/// A predicate node with optional `or` / `and` continuations.
///
/// When the node fails, `or` (if present) decides the result. When it
/// passes, `and` (if present) decides the result.
///
/// ```
/// use msgfilter::predicate::Filter;
/// use serde_json::json;
///
/// let filter: Filter = serde_json::from_value(json!({
///     "path": "$.status",
///     "value": "paid",
///     "or": {"path": "$.status", "value": "refunded"}
/// })).unwrap();
///
/// assert!(filter.test(&json!({"status": "refunded"})).unwrap());
/// assert!(!filter.test(&json!({"status": "open"})).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FilterDocument", into = "FilterDocument")]
pub struct Filter {
    pub matcher: Matcher,
    /// Opaque to evaluation; tells the caller to requeue on failure.
    pub requeue: bool,
    pub or: Option<Box<Filter>>,
    pub and: Option<Box<Filter>>,
}

impl Filter {
    pub fn new(matcher: Matcher) -> Self {
        Self {
            matcher,
            requeue: false,
            or: None,
            and: None,
        }
    }

    pub fn path(path: PathExpr, operator: Operator, value: Value) -> Self {
        Self::new(Matcher::Path {
            path,
            value,
            operator,
        })
    }

    pub fn template(template: Template, operator: Operator, value: Value) -> Self {
        Self::new(Matcher::Template {
            template,
            value,
            operator,
        })
    }

    pub fn script(script: ScriptFilter) -> Self {
        Self::new(Matcher::Script(script))
    }

    pub fn with_requeue(mut self, requeue: bool) -> Self {
        self.requeue = requeue;
        self
    }

    pub fn with_or(mut self, or: Filter) -> Self {
        self.or = Some(Box::new(or));
        self
    }

    pub fn with_and(mut self, and: Filter) -> Self {
        self.and = Some(Box::new(and));
        self
    }

    /// Evaluate against `message` with the built-in functions and interpreters.
    pub fn test(&self, message: &Value) -> Result<bool, FilterError> {
        Evaluator::shared().test(self, message)
    }

    /// Compile-check every script in the tree without running anything.
    pub fn validate_scripts(&self, interpreters: &Interpreters) -> Result<(), ScriptError> {
        if let Matcher::Script(script) = &self.matcher {
            script.validate(interpreters)?;
        }
        for child in [&self.or, &self.and].into_iter().flatten() {
            child.validate_scripts(interpreters)?;
        }
        Ok(())
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + [&self.or, &self.and]
            .into_iter()
            .flatten()
            .map(|child| child.node_count())
            .sum::<usize>()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct FilterDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "is_false")]
    requeue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    or: Option<Box<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    and: Option<Box<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    script: Option<ScriptFilter>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl TryFrom<FilterDocument> for Filter {
    type Error = String;

    fn try_from(doc: FilterDocument) -> Result<Self, Self::Error> {
        let matcher = if let Some(script) = doc.script {
            Matcher::Script(script)
        } else {
            let operator = doc.operator.unwrap_or_default();
            let path = doc.path.filter(|p| !p.is_empty());
            let template = doc.template.filter(|t| !t.is_empty());
            match (path, template) {
                (Some(path), None) => Matcher::Path {
                    path: PathExpr::try_from(path)?,
                    value: doc.value,
                    operator,
                },
                (None, Some(template)) => Matcher::Template {
                    template: Template::parse(&template)
                        .map_err(|e| format!("invalid template '{template}': {e}"))?,
                    value: doc.value,
                    operator,
                },
                (Some(_), Some(_)) => {
                    return Err("`path` and `template` are mutually exclusive".to_string())
                }
                (None, None) => {
                    return Err("filter requires one of `path`, `template` or `script`".to_string())
                }
            }
        };

        Ok(Self {
            matcher,
            requeue: doc.requeue,
            or: doc.or,
            and: doc.and,
        })
    }
}

impl From<Filter> for FilterDocument {
    fn from(filter: Filter) -> Self {
        let mut doc = FilterDocument {
            requeue: filter.requeue,
            or: filter.or,
            and: filter.and,
            ..Default::default()
        };
        match filter.matcher {
            Matcher::Path {
                path,
                value,
                operator,
            } => {
                doc.path = Some(path.into());
                doc.value = value;
                doc.operator = Some(operator);
            }
            Matcher::Template {
                template,
                value,
                operator,
            } => {
                doc.template = Some(template.into());
                doc.value = value;
                doc.operator = Some(operator);
            }
            Matcher::Script(script) => doc.script = Some(script),
        }
        doc
    }
}
