//! Ordered rule sets that turn filter verdicts into pipeline decisions.
//!
//! The `requeue` flag of a rule's root filter is what separates a retryable
//! failure (put the message back) from a final one (drop it).

use crate::error::GateError;
use crate::predicate::{Evaluator, Filter};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A named filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub filter: Filter,
}

impl Rule {
    pub fn new(name: impl Into<String>, filter: Filter) -> Self {
        Self {
            name: name.into(),
            filter,
        }
    }
}

/// Outcome of running a message through a [`Gate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    /// Every rule passed.
    Accept,
    /// `rule` failed and asked for the message to be retried later.
    Requeue { rule: String },
    /// `rule` failed.
    Reject { rule: String },
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    /// Name of the rule that stopped the message, if any.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Decision::Accept => None,
            Decision::Requeue { rule } | Decision::Reject { rule } => Some(rule),
        }
    }
}

/// Evaluates rules in order; the first failing rule decides.
#[derive(Debug, Clone)]
pub struct Gate {
    rules: Vec<Rule>,
    evaluator: Evaluator,
}

impl Gate {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_evaluator(rules, Evaluator::default())
    }

    pub fn with_evaluator(rules: Vec<Rule>, evaluator: Evaluator) -> Self {
        Self { rules, evaluator }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn decide(&self, message: &Value) -> Result<Decision, GateError> {
        for rule in &self.rules {
            let passed = self
                .evaluator
                .test(&rule.filter, message)
                .map_err(|source| GateError::Rule {
                    rule: rule.name.clone(),
                    source,
                })?;
            if passed {
                continue;
            }

            let decision = if rule.filter.requeue {
                Decision::Requeue {
                    rule: rule.name.clone(),
                }
            } else {
                Decision::Reject {
                    rule: rule.name.clone(),
                }
            };
            debug!("Rule '{}' failed: {:?}", rule.name, decision);
            return Ok(decision);
        }

        debug!("All {} rules passed", self.rules.len());
        Ok(Decision::Accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(name: &str, filter: Value) -> Rule {
        Rule::new(name, serde_json::from_value(filter).unwrap())
    }

    fn gate() -> Gate {
        Gate::new(vec![
            rule("has-id", json!({"path": "$.id", "operator": "!=", "value": null})),
            rule(
                "ready",
                json!({"path": "$.status", "value": "ready", "requeue": true}),
            ),
        ])
    }

    #[test]
    fn test_accept() {
        let decision = gate().decide(&json!({"id": 1, "status": "ready"})).unwrap();
        assert_eq!(decision, Decision::Accept);
        assert!(decision.is_accept());
        assert_eq!(decision.rule(), None);
    }

    #[test]
    fn test_reject_on_first_failure() {
        let decision = gate().decide(&json!({"status": "pending"})).unwrap();
        assert_eq!(
            decision,
            Decision::Reject {
                rule: "has-id".to_string()
            }
        );
    }

    #[test]
    fn test_requeue_flag() {
        let decision = gate().decide(&json!({"id": 1, "status": "pending"})).unwrap();
        assert_eq!(decision.rule(), Some("ready"));
        assert!(matches!(decision, Decision::Requeue { .. }));
    }

    #[test]
    fn test_error_names_rule() {
        let gate = Gate::new(vec![rule(
            "broken",
            json!({"path": "$.n", "operator": "in", "value": 3}),
        )]);
        let err = gate.decide(&json!({"n": 3})).unwrap_err();
        let GateError::Rule { rule, .. } = &err;
        assert_eq!(rule, "broken");
        assert!(err.to_string().starts_with("rule 'broken' failed"));
    }

    #[test]
    fn test_empty_gate_accepts() {
        assert!(Gate::new(vec![]).decide(&json!({})).unwrap().is_accept());
    }

    #[test]
    fn test_decision_serialization() {
        let decision = Decision::Requeue {
            rule: "ready".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            json!({"decision": "requeue", "rule": "ready"})
        );
        assert_eq!(
            serde_json::to_value(Decision::Accept).unwrap(),
            json!({"decision": "accept"})
        );
    }
}
