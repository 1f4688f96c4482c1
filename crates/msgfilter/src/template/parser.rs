//! Template source parsing.
//!
//! A template is literal text interleaved with `{{ ... }}` actions. An action
//! is a pipeline of commands separated by `|`; each command is either a single
//! operand or a function name followed by operand arguments.

use super::TemplateError;
use crate::predicate::PathExpr;
use serde_json::{Number, Value};

#[derive(Debug, Clone)]
pub(crate) enum Segment {
    Text(String),
    Action(Pipeline),
}

#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    pub(crate) stages: Vec<Command>,
}

#[derive(Debug, Clone)]
pub(crate) enum Command {
    Operand(Operand),
    Call { name: String, args: Vec<Operand> },
}

#[derive(Debug, Clone)]
pub(crate) enum Operand {
    Literal(Value),
    /// Dotted field access; an empty list is the whole context (`.`).
    Field(Vec<String>),
    Path(PathExpr),
    Group(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Number(Number),
    Ident(String),
    Field(Vec<String>),
    Path(String),
    LParen,
    RParen,
    Pipe,
}

/// Split template source into text and parsed actions.
pub(crate) fn parse_segments(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let body = &rest[start + 2..];
        let end = find_action_end(body).ok_or(TemplateError::UnclosedAction(offset + start))?;
        segments.push(Segment::Action(parse_action(&body[..end])?));

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    Ok(segments)
}

/// Position of the closing `}}`, ignoring braces inside string literals.
fn find_action_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'}' if !in_string && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_action(action: &str) -> Result<Pipeline, TemplateError> {
    let tokens = tokenize(action)?;
    if tokens.is_empty() {
        return Err(TemplateError::EmptyAction);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        action,
    };
    let pipeline = parser.pipeline()?;
    if parser.pos < parser.tokens.len() {
        return Err(TemplateError::UnbalancedParens(action.trim().to_string()));
    }
    Ok(pipeline)
}

/// Control-flow actions are not supported; only expressions are.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "end", "range", "with", "define", "template", "block", "break", "continue",
];

fn tokenize(action: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = action.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, other)) => text.push(other),
                            None => break,
                        },
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnterminatedString(action.trim().to_string()));
                }
                tokens.push(Token::Str(text));
            }
            '.' => {
                let word = take_word(action, start, &mut chars);
                let fields = word[1..]
                    .split('.')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                tokens.push(Token::Field(fields));
            }
            '$' => {
                let word = take_word(action, start, &mut chars);
                if word[1..].starts_with(|c: char| c.is_alphabetic() || c == '_') {
                    return Err(TemplateError::Unsupported(format!("variable {word}")));
                }
                tokens.push(Token::Path(word.to_string()));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let word = take_word(action, start, &mut chars);
                let number = word
                    .parse::<i64>()
                    .map(Number::from)
                    .ok()
                    .or_else(|| word.parse::<f64>().ok().and_then(Number::from_f64))
                    .ok_or_else(|| TemplateError::UnexpectedChar {
                        ch: c,
                        action: action.trim().to_string(),
                    })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let word = take_word(action, start, &mut chars);
                if CONTROL_KEYWORDS.contains(&word) {
                    return Err(TemplateError::Unsupported(word.to_string()));
                }
                tokens.push(Token::Ident(word.to_string()));
            }
            other => {
                return Err(TemplateError::UnexpectedChar {
                    ch: other,
                    action: action.trim().to_string(),
                })
            }
        }
    }

    Ok(tokens)
}

/// Consume a bare word: everything up to whitespace, `|`, `(` or `)` outside
/// of brackets and quotes.
fn take_word<'a>(
    action: &'a str,
    start: usize,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'a>>,
) -> &'a str {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut end = action.len();

    while let Some(&(i, c)) = chars.peek() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' if depth > 0 => quote = Some(c),
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                c if depth == 0 && (c.is_whitespace() || matches!(c, '|' | '(' | ')')) => {
                    end = i;
                    break;
                }
                _ => {}
            },
        }
        chars.next();
    }

    &action[start..end]
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    action: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn action_text(&self) -> String {
        self.action.trim().to_string()
    }

    fn pipeline(&mut self) -> Result<Pipeline, TemplateError> {
        let mut stages = vec![self.command()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let stage = self.command()?;
            if !matches!(stage, Command::Call { .. }) {
                return Err(TemplateError::NonFunctionStage(self.action_text()));
            }
            stages.push(stage);
        }
        Ok(Pipeline { stages })
    }

    fn command(&mut self) -> Result<Command, TemplateError> {
        let name = match self.peek() {
            Some(Token::Ident(name)) if !is_keyword(name) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = name {
            self.pos += 1;
            let mut args = Vec::new();
            while let Some(operand) = self.operand()? {
                args.push(operand);
            }
            return Ok(Command::Call { name, args });
        }

        let operand = self.operand()?.ok_or(TemplateError::EmptyAction)?;
        if self.operand()?.is_some() {
            return Err(TemplateError::UnexpectedOperand(self.action_text()));
        }
        Ok(Command::Operand(operand))
    }

    /// Parse one operand, or `None` at a pipe, closing paren or end of input.
    fn operand(&mut self) -> Result<Option<Operand>, TemplateError> {
        match self.peek() {
            None | Some(Token::Pipe) | Some(Token::RParen) => return Ok(None),
            _ => {}
        }

        let operand = match self.next() {
            Some(Token::Str(s)) => Operand::Literal(Value::String(s)),
            Some(Token::Number(n)) => Operand::Literal(Value::Number(n)),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                "nil" | "null" => Operand::Literal(Value::Null),
                _ => Operand::Group(Pipeline {
                    stages: vec![Command::Call {
                        name: word,
                        args: Vec::new(),
                    }],
                }),
            },
            Some(Token::Field(fields)) => Operand::Field(fields),
            Some(Token::Path(path)) => {
                let expr = PathExpr::parse(&path).map_err(|e| TemplateError::InvalidPath {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                Operand::Path(expr)
            }
            Some(Token::LParen) => {
                let inner = self.pipeline()?;
                if self.next() != Some(Token::RParen) {
                    return Err(TemplateError::UnbalancedParens(self.action_text()));
                }
                Operand::Group(inner)
            }
            Some(Token::RParen) | Some(Token::Pipe) | None => {
                return Err(TemplateError::UnbalancedParens(self.action_text()))
            }
        };

        Ok(Some(operand))
    }
}

fn is_keyword(word: &str) -> bool {
    matches!(word, "true" | "false" | "nil" | "null")
}
