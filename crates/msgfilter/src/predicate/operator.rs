//! Comparison operators and their accepted spellings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a filter node.
///
/// Parsing is case-insensitive and accepts several synonyms per operator.
/// An empty or unrecognized spelling falls back to [`Operator::Equal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    #[default]
    Equal,
    NotEqual,
    In,
    NotIn,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    OlderThan,
    NewerThan,
    RegexMatch,
    RegexNoMatch,
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "!=" | "<>" | "ne" | "doesn't equal" | "not equal to" | "not equal" => {
                Operator::NotEqual
            }
            "in" => Operator::In,
            "not in" | "notin" => Operator::NotIn,
            "<" | "lt" | "less than" => Operator::LessThan,
            ">" | "gt" | "greater than" => Operator::GreaterThan,
            "<=" | "le" | "lte" | "less than or equal to" => Operator::LessOrEqual,
            ">=" | "ge" | "gte" | "greater than or equal to" => Operator::GreaterOrEqual,
            "olderthan" | "older than" | "older" => Operator::OlderThan,
            "newerthan" | "newer than" | "newer" => Operator::NewerThan,
            "regexmatch" | "regex match" => Operator::RegexMatch,
            "regexnomatch" | "regex no match" => Operator::RegexNoMatch,
            _ => Operator::Equal,
        }
    }

    /// Canonical spelling, used when serializing.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::OlderThan => "olderThan",
            Operator::NewerThan => "newerThan",
            Operator::RegexMatch => "regexMatch",
            Operator::RegexNoMatch => "regexNoMatch",
        }
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Operator::parse(&name)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_synonyms() {
        for name in ["=", "==", "eq", "equal", "equals", "EQUALS"] {
            assert_eq!(Operator::parse(name), Operator::Equal, "{name}");
        }
        for name in ["!=", "<>", "ne", "doesn't equal", "not equal to", "NE"] {
            assert_eq!(Operator::parse(name), Operator::NotEqual, "{name}");
        }
    }

    #[test]
    fn test_unknown_defaults_to_equal() {
        assert_eq!(Operator::parse(""), Operator::Equal);
        assert_eq!(Operator::parse("resembles"), Operator::Equal);
    }

    #[test]
    fn test_ordering_synonyms() {
        assert_eq!(Operator::parse("less than"), Operator::LessThan);
        assert_eq!(Operator::parse("GT"), Operator::GreaterThan);
        assert_eq!(Operator::parse("lte"), Operator::LessOrEqual);
        assert_eq!(
            Operator::parse("greater than or equal to"),
            Operator::GreaterOrEqual
        );
    }

    #[test]
    fn test_phrase_variants_case_insensitive() {
        assert_eq!(Operator::parse("olderThan"), Operator::OlderThan);
        assert_eq!(Operator::parse("Older Than"), Operator::OlderThan);
        assert_eq!(Operator::parse("newer"), Operator::NewerThan);
        assert_eq!(Operator::parse("regex match"), Operator::RegexMatch);
        assert_eq!(Operator::parse("RegexNoMatch"), Operator::RegexNoMatch);
        assert_eq!(Operator::parse("Not In"), Operator::NotIn);
    }

    #[test]
    fn test_canonical_names_round_trip() {
        let all = [
            Operator::Equal,
            Operator::NotEqual,
            Operator::In,
            Operator::NotIn,
            Operator::LessThan,
            Operator::GreaterThan,
            Operator::LessOrEqual,
            Operator::GreaterOrEqual,
            Operator::OlderThan,
            Operator::NewerThan,
            Operator::RegexMatch,
            Operator::RegexNoMatch,
        ];
        for op in all {
            assert_eq!(Operator::parse(op.as_str()), op);
        }
    }
}
