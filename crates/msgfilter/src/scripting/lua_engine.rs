use super::{ScriptError, ScriptInterpreter};
use mlua::prelude::*;
use serde_json::Value;

/// Lua interpreter backed by mlua.
///
/// A script may be a bare expression or a chunk ending in `return`:
///
/// ```lua
/// input.retries < metadata.max_retries
/// ```
///
/// Only `nil` and `false` reject the message. Lists become 1-based tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaInterpreter;

impl ScriptInterpreter for LuaInterpreter {
    fn name(&self) -> &'static str {
        "lua"
    }

    fn execute(&self, source: &str, message: &Value, metadata: &Value) -> Result<bool, ScriptError> {
        let lua = Lua::new();
        let result = run(&lua, source, message, metadata).map_err(execution_error)?;
        Ok(!matches!(result, LuaValue::Nil | LuaValue::Boolean(false)))
    }

    fn validate(&self, source: &str) -> Result<(), ScriptError> {
        let lua = Lua::new();
        // Expressions compile only with a leading `return`.
        if lua.load(format!("return {source}")).into_function().is_ok() {
            return Ok(());
        }
        lua.load(source)
            .into_function()
            .map(|_| ())
            .map_err(|e| ScriptError::Execution {
                engine: "lua",
                message: format!("failed to compile script: {e}"),
            })
    }
}

fn run(lua: &Lua, source: &str, message: &Value, metadata: &Value) -> LuaResult<LuaValue> {
    let globals = lua.globals();
    globals.set("input", json_to_lua(lua, message)?)?;
    globals.set("metadata", json_to_lua(lua, metadata)?)?;
    lua.load(source).eval::<LuaValue>()
}

fn execution_error(e: LuaError) -> ScriptError {
    ScriptError::Execution {
        engine: "lua",
        message: e.to_string(),
    }
}

fn json_to_lua(lua: &Lua, value: &Value) -> LuaResult<LuaValue> {
    match value {
        Value::Null => Ok(LuaValue::Nil),
        Value::Bool(b) => Ok(LuaValue::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(LuaValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(LuaValue::Number(f))
            } else {
                Ok(LuaValue::Nil)
            }
        }
        Value::String(s) => Ok(LuaValue::String(lua.create_string(s)?)),
        Value::Array(arr) => {
            let table = lua.create_table()?;
            for (i, v) in arr.iter().enumerate() {
                table.set(i + 1, json_to_lua(lua, v)?)?;
            }
            Ok(LuaValue::Table(table))
        }
        Value::Object(obj) => {
            let table = lua.create_table()?;
            for (k, v) in obj {
                table.set(k.as_str(), json_to_lua(lua, v)?)?;
            }
            Ok(LuaValue::Table(table))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(source: &str, message: Value) -> Result<bool, ScriptError> {
        LuaInterpreter.execute(source, &message, &json!({}))
    }

    #[test]
    fn test_expression_result() {
        assert!(run("input.value == 42", json!({"value": 42})).unwrap());
        assert!(!run("input.value == 42", json!({"value": 1})).unwrap());
    }

    #[test]
    fn test_chunk_with_return() {
        let script = r#"
            local total = 0
            for _, price in ipairs(input.prices) do total = total + price end
            return total > 10
        "#;
        assert!(run(script, json!({"prices": [4, 5, 6]})).unwrap());
    }

    #[test]
    fn test_truthiness() {
        assert!(run("0", json!({})).unwrap());
        assert!(!run("input.missing", json!({})).unwrap());
        assert!(!run("false", json!({})).unwrap());
    }

    #[test]
    fn test_metadata_binding() {
        let passed = LuaInterpreter
            .execute(
                "input.region == metadata.region",
                &json!({"region": "eu"}),
                &json!({"region": "eu"}),
            )
            .unwrap();
        assert!(passed);
    }

    #[test]
    fn test_runtime_error() {
        let err = run("error('nope')", json!({})).unwrap_err();
        assert!(matches!(err, ScriptError::Execution { engine: "lua", .. }));
    }

    #[test]
    fn test_validate() {
        assert!(LuaInterpreter.validate("input.a == 1").is_ok());
        assert!(LuaInterpreter.validate("return input.a == 1").is_ok());
        assert!(LuaInterpreter.validate("input.a == (").is_err());
    }
}
