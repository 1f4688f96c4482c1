use super::{ScriptError, ScriptInterpreter};
use rhai::{Dynamic, Engine, Map, Scope};
use serde_json::Value;

/// Rhai interpreter.
///
/// ```rhai
/// input.amount > metadata.threshold && input.currency == "EUR"
/// ```
///
/// The script's value must be a boolean; `()` and every other type are
/// rejected. JSON `null` is bound as `()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RhaiInterpreter;

impl RhaiInterpreter {
    pub fn create_engine() -> Engine {
        Engine::new()
    }
}

impl ScriptInterpreter for RhaiInterpreter {
    fn name(&self) -> &'static str {
        "rhai"
    }

    fn execute(&self, source: &str, message: &Value, metadata: &Value) -> Result<bool, ScriptError> {
        let engine = Self::create_engine();
        let mut scope = Scope::new();
        scope.push_dynamic("input", json_to_dynamic(message.clone()));
        scope.push_dynamic("metadata", json_to_dynamic(metadata.clone()));

        let result: Dynamic = engine
            .eval_with_scope(&mut scope, source)
            .map_err(|e| ScriptError::Execution {
                engine: "rhai",
                message: e.to_string(),
            })?;

        result.as_bool().map_err(|type_name| ScriptError::NotBoolean {
            engine: "rhai",
            found: type_name.to_string(),
        })
    }

    fn validate(&self, source: &str) -> Result<(), ScriptError> {
        Self::create_engine()
            .compile(source)
            .map(|_| ())
            .map_err(|e| ScriptError::Execution {
                engine: "rhai",
                message: format!("failed to compile script: {e}"),
            })
    }
}

pub(super) fn json_to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::UNIT
            }
        }
        Value::String(s) => Dynamic::from(s),
        Value::Array(arr) => {
            let vec: Vec<Dynamic> = arr.into_iter().map(json_to_dynamic).collect();
            Dynamic::from(vec)
        }
        Value::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.into(), json_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}
