//! Text templates rendered against a message.
//!
//! Templates address the subject of a filter (`template: "{{ .user.id }}"`)
//! and make literals message-relative (`value: "{{ .expected }}"`).
//!
//! # Syntax
//!
//! - `{{ . }}` - the whole message
//! - `{{ .a.b.0 }}` - dotted field access, numeric segments index lists
//! - `{{ $.a[0] }}` - JSONPath query (first match)
//! - `{{ "text" }}`, `{{ 42 }}`, `{{ true }}`, `{{ nil }}` - literals
//! - `{{ fn arg1 arg2 }}` - function call, `(fn arg)` nests a call
//! - `{{ .name | upper }}` - pipeline, the left value becomes the last argument
//!
//! Missing fields render as an empty string. Lists and maps render as
//! compact JSON.
//!
//! # Example
//!
//! ```
//! use msgfilter::template::{Functions, Template};
//! use serde_json::json;
//!
//! let template = Template::parse("order {{ .id }} for {{ .customer.name | upper }}").unwrap();
//! let msg = json!({"id": 7, "customer": {"name": "ada"}});
//! assert_eq!(template.render(&msg, &Functions::builtin()).unwrap(), "order 7 for ADA");
//! ```

mod functions;
mod parser;

pub use functions::{Functions, TemplateFn};

use parser::{Command, Operand, Pipeline, Segment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Errors raised while parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {0}")]
    UnclosedAction(usize),
    #[error("unterminated string literal in action '{0}'")]
    UnterminatedString(String),
    #[error("unexpected character '{ch}' in action '{action}'")]
    UnexpectedChar { ch: char, action: String },
    #[error("unbalanced parentheses in action '{0}'")]
    UnbalancedParens(String),
    #[error("empty action")]
    EmptyAction,
    #[error("unexpected operand in action '{0}'")]
    UnexpectedOperand(String),
    #[error("pipeline stage in '{0}' must be a function call")]
    NonFunctionStage(String),
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },
    #[error("unsupported template construct '{0}'")]
    Unsupported(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' failed: {message}")]
    Function { name: String, message: String },
}

/// A parsed template.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    segments: Arc<Vec<Segment>>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            source: source.to_string(),
            segments: Arc::new(parser::parse_segments(source)?),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render the template with `context` as the root value (`.`).
    pub fn render(&self, context: &Value, functions: &Functions) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in self.segments.iter() {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Action(pipeline) => {
                    let value = eval_pipeline(pipeline, context, functions)?;
                    out.push_str(&display_value(&value));
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render `source` in one step.
///
/// Text without any `{{` is returned unchanged without parsing.
pub fn interpolate(
    source: &str,
    context: &Value,
    functions: &Functions,
) -> Result<String, TemplateError> {
    if !source.contains("{{") {
        return Ok(source.to_string());
    }
    Template::parse(source)?.render(context, functions)
}

/// Text form of a value as it appears in rendered output.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn eval_pipeline(
    pipeline: &Pipeline,
    context: &Value,
    functions: &Functions,
) -> Result<Value, TemplateError> {
    let mut piped: Option<Value> = None;
    for stage in &pipeline.stages {
        let value = match stage {
            Command::Operand(operand) => eval_operand(operand, context, functions)?,
            Command::Call { name, args } => {
                let mut values = args
                    .iter()
                    .map(|arg| eval_operand(arg, context, functions))
                    .collect::<Result<Vec<_>, _>>()?;
                values.extend(piped.take());
                functions.call(name, &values)?
            }
        };
        piped = Some(value);
    }
    Ok(piped.unwrap_or(Value::Null))
}

fn eval_operand(
    operand: &Operand,
    context: &Value,
    functions: &Functions,
) -> Result<Value, TemplateError> {
    match operand {
        Operand::Literal(value) => Ok(value.clone()),
        Operand::Field(fields) => Ok(lookup_field(context, fields)),
        Operand::Path(path) => Ok(path.first(context)),
        Operand::Group(pipeline) => eval_pipeline(pipeline, context, functions),
    }
}

fn lookup_field(context: &Value, fields: &[String]) -> Value {
    let mut current = context;
    for field in fields {
        let next = match current {
            Value::Object(map) => map.get(field),
            Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Value::Null,
        }
    }
    current.clone()
}

impl TryFrom<String> for Template {
    type Error = TemplateError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Template::parse(&source)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.source
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.source).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, context: &Value) -> String {
        Template::parse(source)
            .unwrap()
            .render(context, &Functions::builtin())
            .unwrap()
    }

    #[test]
    fn test_render_fields() {
        let msg = json!({"value": "test", "n": 3, "flag": true});
        assert_eq!(render("{{.value}}", &msg), "test");
        assert_eq!(render("{{ .n }}-{{ .flag }}", &msg), "3-true");
    }

    #[test]
    fn test_missing_and_null_render_empty() {
        assert_eq!(render("[{{.value}}]", &json!({})), "[]");
        assert_eq!(render("[{{.value}}]", &json!({"value": null})), "[]");
        assert_eq!(render("[{{.a.b.c}}]", &json!({"a": 1})), "[]");
    }

    #[test]
    fn test_list_index_and_json_rendering() {
        let msg = json!({"items": [{"id": "x"}, {"id": "y"}], "tags": ["a", "b"]});
        assert_eq!(render("{{ .items.1.id }}", &msg), "y");
        assert_eq!(render("{{ .tags }}", &msg), r#"["a","b"]"#);
    }

    #[test]
    fn test_jsonpath_operand() {
        let msg = json!({"items": [{"id": "x"}]});
        assert_eq!(render("{{ $.items[0].id }}", &msg), "x");
    }

    #[test]
    fn test_jsonpath_operand_takes_first_match() {
        let msg = json!({"items": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(render("{{ $.items[*].id }}", &msg), "a");
        assert_eq!(render("[{{ $.absent[*] }}]", &msg), "[]");
    }

    #[test]
    fn test_pipeline_and_groups() {
        let msg = json!({"name": " Ada "});
        assert_eq!(render("{{ .name | trim | upper }}", &msg), "ADA");
        assert_eq!(render(r#"{{ print "<" (trim .name) ">" }}"#, &msg), "<Ada>");
        assert_eq!(render(r#"{{ .missing | default "anon" }}"#, &msg), "anon");
    }

    #[test]
    fn test_env_function() {
        std::env::set_var("MSGFILTER_TEMPLATE_TEST_VAR", "secret");
        assert_eq!(
            render(r#"{{ env "MSGFILTER_TEMPLATE_TEST_VAR" }}"#, &json!({})),
            "secret"
        );
        assert_eq!(
            render(r#"{{ env "MSGFILTER_TEMPLATE_TEST_UNSET" }}"#, &json!({})),
            ""
        );
    }

    #[test]
    fn test_unknown_function_is_render_error() {
        let template = Template::parse("{{ lookup .id }}").unwrap();
        let err = template
            .render(&json!({"id": 1}), &Functions::builtin())
            .unwrap_err();
        assert_eq!(err, TemplateError::UnknownFunction("lookup".to_string()));
    }

    #[test]
    fn test_interpolate_plain_text_shortcut() {
        let out = interpolate("no actions", &json!({}), &Functions::empty()).unwrap();
        assert_eq!(out, "no actions");
    }

    #[test]
    fn test_serde_round_trip() {
        let template: Template = serde_json::from_value(json!("{{ .a }}")).unwrap();
        assert_eq!(template.as_str(), "{{ .a }}");
        assert_eq!(serde_json::to_value(&template).unwrap(), json!("{{ .a }}"));
        assert!(serde_json::from_value::<Template>(json!("{{ .a")).is_err());
    }
}
