//! Predicate model and evaluator.
//!
//! A [`Filter`] locates a subject in a message (JSONPath query or rendered
//! template), resolves a literal to compare it with, and applies an
//! [`Operator`]. Nodes chain through `or` (tried when the node fails) and
//! `and` (required when the node passes). A node carrying a script delegates
//! the decision to an embedded interpreter instead.
//!
//! # Module Structure
//!
//! - `filter` - filter nodes and their wire format
//! - `evaluator` - operator semantics and the `or`/`and` combinator
//! - `operator` - operators and their accepted spellings
//! - `path` - JSONPath subjects
//! - `normalize` - numeric normalization and coercion

mod evaluator;
mod filter;
mod normalize;
mod operator;
mod path;

pub use evaluator::Evaluator;
pub use filter::{Filter, Matcher};
pub use normalize::{kind_name, normalize, to_f64};
pub use operator::Operator;
pub use path::PathExpr;
