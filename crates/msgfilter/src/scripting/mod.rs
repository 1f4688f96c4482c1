//! Script filters: delegate a node's decision to an embedded interpreter.
//!
//! A script node binds the message as `input` and the node's static metadata
//! as `metadata`, runs the script in a fresh runtime and coerces the result to
//! a boolean.
//!
//! # Interpreters
//!
//! - `rhai` - always available; the script must evaluate to a boolean
//! - `javascript` / `js` / `es5` - Boa engine, `javascript` feature; JS truthiness
//! - `lua` - mlua, `lua` feature; Lua truthiness
//!
//! Further dialects are added with [`Interpreters::register`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

mod rhai_engine;
pub use rhai_engine::RhaiInterpreter;

#[cfg(feature = "javascript")]
mod js_engine;
#[cfg(feature = "javascript")]
pub use js_engine::JsInterpreter;

#[cfg(feature = "lua")]
mod lua_engine;
#[cfg(feature = "lua")]
pub use lua_engine::LuaInterpreter;

/// Errors raised while selecting, loading or running a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("unsupported interpreter '{0}'")]
    UnsupportedInterpreter(String),

    #[error("interpreter '{interpreter}' is not enabled; enable the '{feature}' feature flag")]
    Disabled {
        interpreter: String,
        feature: &'static str,
    },

    #[error("failed to read script file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{engine}] script failed: {message}")]
    Execution {
        engine: &'static str,
        message: String,
    },

    #[error("[{engine}] script returned {found}, expected a boolean")]
    NotBoolean { engine: &'static str, found: String },
}

/// An embeddable script runtime.
///
/// Implementations must build a fresh runtime for every call so concurrent
/// evaluations never share interpreter state.
pub trait ScriptInterpreter: Send + Sync {
    /// Engine name used in error messages.
    fn name(&self) -> &'static str;

    /// Run `source` with `input` and `metadata` bound, returning its boolean result.
    fn execute(&self, source: &str, message: &Value, metadata: &Value) -> Result<bool, ScriptError>;

    /// Check that `source` compiles without running it.
    fn validate(&self, _source: &str) -> Result<(), ScriptError> {
        Ok(())
    }
}

/// Registry of interpreters keyed by case-insensitive name.
#[derive(Clone)]
pub struct Interpreters {
    entries: HashMap<String, Arc<dyn ScriptInterpreter>>,
}

impl Interpreters {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Every interpreter compiled into this build.
    pub fn builtin() -> Self {
        let mut interpreters = Self::empty();
        interpreters.register("rhai", Arc::new(RhaiInterpreter));

        #[cfg(feature = "javascript")]
        {
            let js: Arc<dyn ScriptInterpreter> = Arc::new(JsInterpreter);
            for alias in ["javascript", "js", "es5"] {
                interpreters.register(alias, Arc::clone(&js));
            }
        }

        #[cfg(feature = "lua")]
        interpreters.register("lua", Arc::new(LuaInterpreter));

        interpreters
    }

    /// Register (or replace) an interpreter under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        interpreter: Arc<dyn ScriptInterpreter>,
    ) -> &mut Self {
        self.entries
            .insert(name.into().to_lowercase(), interpreter);
        self
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn ScriptInterpreter>, ScriptError> {
        let key = name.to_lowercase();
        if let Some(interpreter) = self.entries.get(&key) {
            return Ok(interpreter);
        }
        match key.as_str() {
            #[cfg(not(feature = "javascript"))]
            "javascript" | "js" | "es5" => Err(ScriptError::Disabled {
                interpreter: name.to_string(),
                feature: "javascript",
            }),
            #[cfg(not(feature = "lua"))]
            "lua" => Err(ScriptError::Disabled {
                interpreter: name.to_string(),
                feature: "lua",
            }),
            _ => Err(ScriptError::UnsupportedInterpreter(name.to_string())),
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Interpreters {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Interpreters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreters")
            .field("names", &self.names())
            .finish()
    }
}

/// Where a script's source comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptSource {
    Inline(String),
    File(PathBuf),
}

impl ScriptSource {
    /// The script text; file sources are read on every call.
    pub fn load(&self) -> Result<Cow<'_, str>, ScriptError> {
        match self {
            ScriptSource::Inline(source) => Ok(Cow::Borrowed(source)),
            ScriptSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ScriptError::Read {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// Script directive of a filter node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScriptDocument", into = "ScriptDocument")]
pub struct ScriptFilter {
    pub interpreter: String,
    pub source: ScriptSource,
    /// Static bindings exposed to the script as `metadata`.
    pub metadata: Map<String, Value>,
}

impl ScriptFilter {
    pub fn inline(interpreter: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            source: ScriptSource::Inline(source.into()),
            metadata: Map::new(),
        }
    }

    pub fn file(interpreter: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            source: ScriptSource::File(path.into()),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Run the script against `message`.
    pub fn evaluate(&self, message: &Value, interpreters: &Interpreters) -> Result<bool, ScriptError> {
        let interpreter = interpreters.get(&self.interpreter)?;
        let source = self.source.load()?;
        debug!(
            "Running {} script ({} bytes)",
            interpreter.name(),
            source.len()
        );
        interpreter.execute(&source, message, &Value::Object(self.metadata.clone()))
    }

    /// Compile-check the script without running it.
    pub fn validate(&self, interpreters: &Interpreters) -> Result<(), ScriptError> {
        let interpreter = interpreters.get(&self.interpreter)?;
        interpreter.validate(&self.source.load()?)
    }
}

/// Wire form of [`ScriptFilter`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptDocument {
    interpreter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    script_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,
}

impl TryFrom<ScriptDocument> for ScriptFilter {
    type Error = String;

    fn try_from(doc: ScriptDocument) -> Result<Self, Self::Error> {
        let script = doc.script.filter(|s| !s.is_empty());
        let script_file = doc.script_file.filter(|p| !p.as_os_str().is_empty());
        let source = match (script, script_file) {
            (Some(source), None) => ScriptSource::Inline(source),
            (None, Some(path)) => ScriptSource::File(path),
            (Some(_), Some(_)) => {
                return Err("`script` and `scriptFile` are mutually exclusive".to_string())
            }
            (None, None) => return Err("script filter requires `script` or `scriptFile`".to_string()),
        };

        Ok(Self {
            interpreter: doc.interpreter,
            source,
            metadata: doc.metadata.unwrap_or_default(),
        })
    }
}

impl From<ScriptFilter> for ScriptDocument {
    fn from(filter: ScriptFilter) -> Self {
        let (script, script_file) = match filter.source {
            ScriptSource::Inline(source) => (Some(source), None),
            ScriptSource::File(path) => (None, Some(path)),
        };
        Self {
            interpreter: filter.interpreter,
            script,
            script_file,
            metadata: (!filter.metadata.is_empty()).then_some(filter.metadata),
        }
    }
}
