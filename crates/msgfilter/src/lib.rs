//! Declarative message filtering.
//!
//! `msgfilter` decides whether a JSON message satisfies a condition written
//! as a tree of [`Filter`] nodes. Each node addresses a subject (JSONPath
//! query or template), compares it against a literal with an [`Operator`],
//! or hands the decision to an embedded script interpreter. A [`Gate`] runs
//! an ordered set of named filters and reports whether a message should be
//! accepted, requeued or rejected.
//!
//! ```
//! use msgfilter::Filter;
//! use serde_json::json;
//!
//! let filter: Filter = serde_yaml::from_str(r#"
//! path: $.attempts
//! operator: "<"
//! value: 3
//! and:
//!   path: $.kind
//!   operator: in
//!   value: [order, refund]
//! "#).unwrap();
//!
//! assert!(filter.test(&json!({"attempts": 1, "kind": "refund"})).unwrap());
//! assert!(!filter.test(&json!({"attempts": 5, "kind": "refund"})).unwrap());
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod predicate;
pub mod scripting;
pub mod template;
pub mod time;

pub use config::{ConfigError, GateConfig, RuleConfig};
pub use error::{FilterError, GateError};
pub use gate::{Decision, Gate, Rule};
pub use predicate::{Evaluator, Filter, Matcher, Operator, PathExpr};
pub use scripting::{Interpreters, ScriptError, ScriptFilter, ScriptInterpreter, ScriptSource};
pub use template::{Functions, Template, TemplateError};
