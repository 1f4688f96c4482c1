//! Rule file loading.
//!
//! A rule file lists named filters evaluated in order by a [`Gate`]:
//!
//! ```yaml
//! rules:
//!   - name: has-id
//!     filter:
//!       path: $.id
//!       operator: "!="
//!       value: null
//!   - name: fresh
//!     filter:
//!       path: $.created_at
//!       operator: newerThan
//!       value: 15m
//!       requeue: true
//! ```
//!
//! Files ending in `.json` are parsed as JSON, everything else as YAML.

use crate::gate::{Gate, Rule};
use crate::predicate::{Evaluator, Filter};
use crate::scripting::Interpreters;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub filter: Filter,
}

impl GateConfig {
    /// Load and validate a rule file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_yaml_str(&contents)?
        };

        debug!(
            "Loaded {} rules from {}",
            config.rules.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GateConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GateConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check rule names and compile every script with the built-in interpreters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(&Interpreters::builtin())
    }

    pub fn validate_with(&self, interpreters: &Interpreters) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::Invalid("at least one rule is required".to_string()));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::Invalid("rule names must not be empty".to_string()));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate rule name '{}'",
                    rule.name
                )));
            }
            rule.filter.validate_scripts(interpreters).map_err(|e| {
                ConfigError::Invalid(format!("invalid script in rule '{}': {e}", rule.name))
            })?;
        }
        Ok(())
    }

    pub fn into_gate(self) -> Gate {
        self.into_gate_with(Evaluator::default())
    }

    pub fn into_gate_with(self, evaluator: Evaluator) -> Gate {
        let rules = self
            .rules
            .into_iter()
            .map(|rule| Rule::new(rule.name, rule.filter))
            .collect();
        Gate::with_evaluator(rules, evaluator)
    }
}
