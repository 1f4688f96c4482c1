//! Type normalization and numeric coercion.
//!
//! Numbers decoded as integers and numbers decoded as decimals must compare
//! equal, so every top-level number is turned into its `f64` form before a
//! comparison. Nested list and map members are left as decoded.

use super::Operator;
use crate::error::FilterError;
use serde_json::{Number, Value};

/// Name of a value's variant, for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Convert a top-level number to its float form; other values pass through.
pub fn normalize(value: Value, operator: Operator) -> Result<Value, FilterError> {
    match value {
        Value::Number(n) => {
            let float = n
                .as_f64()
                .and_then(Number::from_f64)
                .ok_or_else(|| FilterError::type_mismatch(operator, "finite number", n.to_string()))?;
            Ok(Value::Number(float))
        }
        other => Ok(other),
    }
}

/// Coerce an operand to `f64` for the ordering operators.
///
/// Numbers are taken as-is and strings are parsed; anything else is a type
/// mismatch.
pub fn to_f64(value: &Value, operator: Operator) -> Result<f64, FilterError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FilterError::type_mismatch(operator, "number", n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FilterError::type_mismatch(operator, "numeric string", format!("{s:?}"))),
        other => Err(FilterError::type_mismatch(operator, "number", kind_name(other))),
    }
}
