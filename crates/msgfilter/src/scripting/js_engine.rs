use super::{ScriptError, ScriptInterpreter};
use boa_engine::{
    js_string, object::builtins::JsArray, Context, JsObject, JsResult, JsValue, Script, Source,
};
use serde_json::Value;

/// JavaScript interpreter backed by Boa.
///
/// ```javascript
/// input.items.length > 0 && input.status !== metadata.blocked
/// ```
///
/// The completion value of the script is coerced with JavaScript
/// truthiness, so `undefined`, `0` and `""` reject the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsInterpreter;

impl ScriptInterpreter for JsInterpreter {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn execute(&self, source: &str, message: &Value, metadata: &Value) -> Result<bool, ScriptError> {
        let mut context = Context::default();
        bind_globals(&mut context, message, metadata).map_err(execution_error)?;

        let result = context
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(execution_error)?;
        Ok(result.to_boolean())
    }

    fn validate(&self, source: &str) -> Result<(), ScriptError> {
        let mut context = Context::default();
        Script::parse(Source::from_bytes(source.as_bytes()), None, &mut context)
            .map(|_| ())
            .map_err(|e| ScriptError::Execution {
                engine: "javascript",
                message: format!("failed to parse script: {e}"),
            })
    }
}

fn execution_error(e: boa_engine::JsError) -> ScriptError {
    ScriptError::Execution {
        engine: "javascript",
        message: e.to_string(),
    }
}

fn bind_globals(context: &mut Context, message: &Value, metadata: &Value) -> JsResult<()> {
    let input = json_to_js(context, message)?;
    let metadata = json_to_js(context, metadata)?;
    let global = context.global_object();
    global.set(js_string!("input"), input, false, context)?;
    global.set(js_string!("metadata"), metadata, false, context)?;
    Ok(())
}

/// Plain objects need `Object.prototype` so `hasOwnProperty` and friends work.
fn create_js_object(context: &Context) -> JsObject {
    JsObject::with_object_proto(context.intrinsics())
}

fn json_to_js(context: &mut Context, value: &Value) -> JsResult<JsValue> {
    match value {
        Value::Null => Ok(JsValue::null()),
        Value::Bool(b) => Ok(JsValue::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(JsValue::from(i))
            } else if let Some(f) = n.as_f64() {
                Ok(JsValue::from(f))
            } else {
                Ok(JsValue::null())
            }
        }
        Value::String(s) => Ok(JsValue::from(js_string!(s.clone()))),
        Value::Array(arr) => {
            let js_arr = JsArray::new(context);
            for (i, v) in arr.iter().enumerate() {
                let js_val = json_to_js(context, v)?;
                js_arr.set(i as u32, js_val, false, context)?;
            }
            Ok(js_arr.into())
        }
        Value::Object(obj) => {
            let js_obj = create_js_object(context);
            for (k, v) in obj {
                let js_val = json_to_js(context, v)?;
                js_obj.set(js_string!(k.clone()), js_val, false, context)?;
            }
            Ok(js_obj.into())
        }
    }
}
