//! Function registry available to template actions.
//!
//! The built-ins cover the common cases (`env`, `randomInt`, `print`, ...).
//! Callers add their own functions, such as HTTP lookups or caches, with
//! [`Functions::register`]; the engine treats them as black boxes.

use super::{display_value, TemplateError};
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a template function. Errors are reported as plain messages.
pub type TemplateFn = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// Named functions callable from template actions.
#[derive(Clone)]
pub struct Functions {
    entries: HashMap<String, Arc<TemplateFn>>,
}

impl Functions {
    /// An empty registry, without the built-ins.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// A registry holding the built-in functions.
    pub fn builtin() -> Self {
        let mut functions = Self::empty();
        functions
            .register("env", env)
            .register("randomInt", random_int)
            .register("print", print)
            .register("lower", |args| map_text("lower", args, |s| s.to_lowercase()))
            .register("upper", |args| map_text("upper", args, |s| s.to_uppercase()))
            .register("trim", |args| map_text("trim", args, |s| s.trim().to_string()))
            .register("now", now)
            .register("default", default)
            .register("json", json)
            .register("dict", dict);
        functions
    }

    /// Register (or replace) a function.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(function));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register(name, function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn call(&self, name: &str, args: &[Value]) -> Result<Value, TemplateError> {
        let function = self
            .entries
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFunction(name.to_string()))?;
        function(args).map_err(|message| TemplateError::Function {
            name: name.to_string(),
            message,
        })
    }
}

impl Default for Functions {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Functions").field("names", &names).finish()
    }
}

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(format!(
            "{name} expects {expected} argument(s), got {}",
            args.len()
        ))
    }
}

fn as_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| format!("{n} is not an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("{s:?} is not an integer")),
        other => Err(format!("{other} is not an integer")),
    }
}

fn env(args: &[Value]) -> Result<Value, String> {
    expect_arity("env", args, 1)?;
    let name = display_value(&args[0]);
    Ok(Value::String(std::env::var(name).unwrap_or_default()))
}

fn random_int(args: &[Value]) -> Result<Value, String> {
    expect_arity("randomInt", args, 2)?;
    let min = as_integer(&args[0])?;
    let max = as_integer(&args[1])?;
    if min > max {
        return Err(format!("empty range {min}..={max}"));
    }
    Ok(Value::from(rand::thread_rng().gen_range(min..=max)))
}

fn print(args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(args.iter().map(display_value).collect()))
}

fn map_text(name: &str, args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, String> {
    expect_arity(name, args, 1)?;
    Ok(Value::String(f(&display_value(&args[0]))))
}

fn now(args: &[Value]) -> Result<Value, String> {
    expect_arity("now", args, 0)?;
    Ok(Value::String(chrono::Utc::now().to_rfc3339()))
}

/// `default FALLBACK VALUE`: the value unless it is null, empty or false.
fn default(args: &[Value]) -> Result<Value, String> {
    expect_arity("default", args, 2)?;
    let is_empty = match &args[1] {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) | Value::Bool(true) => false,
    };
    Ok(if is_empty {
        args[0].clone()
    } else {
        args[1].clone()
    })
}

fn json(args: &[Value]) -> Result<Value, String> {
    expect_arity("json", args, 1)?;
    serde_json::to_string(&args[0])
        .map(Value::String)
        .map_err(|e| e.to_string())
}

fn dict(args: &[Value]) -> Result<Value, String> {
    if args.len() % 2 != 0 {
        return Err("dict expects key/value pairs".to_string());
    }
    let mut map = Map::new();
    for pair in args.chunks(2) {
        map.insert(display_value(&pair[0]), pair[1].clone());
    }
    Ok(Value::Object(map))
}
