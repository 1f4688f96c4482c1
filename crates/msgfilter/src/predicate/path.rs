//! Path addressing for filter subjects.
//!
//! Paths are RFC 9535 JSONPath queries. A path that does not start with `$`
//! is taken relative to the document root, so `value` and `$.value` address
//! the same field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json_path::JsonPath;
use std::fmt;
use std::sync::Arc;

/// A compiled path expression together with its source text.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathExpr {
    source: String,
    compiled: Arc<JsonPath>,
}

impl PathExpr {
    /// Compile a path expression.
    pub fn parse(source: &str) -> Result<Self, serde_json_path::ParseError> {
        let normalized = if source.starts_with('$') {
            source.to_string()
        } else if source.starts_with('[') {
            format!("${source}")
        } else {
            format!("$.{source}")
        };
        let compiled = JsonPath::parse(&normalized)?;

        Ok(Self {
            source: source.to_string(),
            compiled: Arc::new(compiled),
        })
    }

    /// The expression as written in the filter definition.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolve the path against a document.
    ///
    /// No match yields `null`, a single match yields the matched value and
    /// several matches (wildcards, slices) yield a list of all of them.
    pub fn resolve(&self, document: &Value) -> Value {
        let nodes = self.compiled.query(document);
        match nodes.len() {
            0 => Value::Null,
            1 => nodes.first().cloned().unwrap_or(Value::Null),
            _ => Value::Array(nodes.iter().map(|v| (*v).clone()).collect()),
        }
    }

    /// The first match in document order, or `null` when nothing matches.
    pub fn first(&self, document: &Value) -> Value {
        self.compiled
            .query(document)
            .first()
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl TryFrom<String> for PathExpr {
    type Error = String;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        PathExpr::parse(&source).map_err(|e| format!("invalid path '{source}': {e}"))
    }
}

impl From<PathExpr> for String {
    fn from(path: PathExpr) -> Self {
        path.source
    }
}

impl PartialEq for PathExpr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathExpr").field(&self.source).finish()
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
