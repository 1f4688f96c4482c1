//! End-to-end behaviour of filter documents loaded the way a pipeline loads them.

use chrono::{Duration, SecondsFormat, Utc};
use msgfilter::{Decision, Filter, FilterError, GateConfig};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::io::Write;

fn filter(doc: Value) -> Filter {
    serde_json::from_value(doc).unwrap()
}

fn ago(minutes: i64) -> String {
    (Utc::now() - Duration::minutes(minutes)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[test]
fn operator_synonyms_behave_alike() {
    let msg = json!({"n": 10});
    for spelling in ["<", "lt", "LT", "less than"] {
        let f = filter(json!({"path": "$.n", "operator": spelling, "value": 11}));
        assert!(f.test(&msg).unwrap(), "spelling {spelling:?}");
    }
    for spelling in ["!=", "<>", "ne", "doesn't equal", "not equal to"] {
        let f = filter(json!({"path": "$.n", "operator": spelling, "value": 11}));
        assert!(f.test(&msg).unwrap(), "spelling {spelling:?}");
    }
}

#[test]
fn unknown_operator_falls_back_to_equality() {
    let f = filter(json!({"path": "$.n", "operator": "roughly", "value": 10}));
    assert!(f.test(&json!({"n": 10})).unwrap());
    assert!(!f.test(&json!({"n": 11})).unwrap());
}

#[test]
fn relative_paths_address_the_root() {
    let f = filter(json!({"path": "order.id", "value": 5}));
    assert!(f.test(&json!({"order": {"id": 5}})).unwrap());
}

#[test]
fn temporal_window_on_epoch_and_rfc3339() {
    let older = filter(json!({"path": "$.ts", "operator": "older than", "value": "1 hour"}));
    let epoch = (Utc::now() - Duration::hours(2)).timestamp().to_string();
    assert!(older.test(&json!({ "ts": epoch })).unwrap());
    assert!(!older.test(&json!({ "ts": ago(30) })).unwrap());

    let newer = filter(json!({"path": "$.ts", "operator": "newer", "value": "1h30m"}));
    assert!(newer.test(&json!({ "ts": ago(60) })).unwrap());
    assert!(!newer.test(&json!({ "ts": ago(120) })).unwrap());
}

#[test]
fn requeue_tree_from_yaml() {
    let yaml = r#"
path: $.status
value: complete
or:
  path: $.status
  value: pending
  and:
    path: $.attempts
    operator: "<"
    value: 3
"#;
    let f: Filter = serde_yaml::from_str(yaml).unwrap();
    assert!(f.test(&json!({"status": "complete"})).unwrap());
    assert!(f.test(&json!({"status": "pending", "attempts": 1})).unwrap());
    assert!(!f.test(&json!({"status": "pending", "attempts": 3})).unwrap());
    assert!(!f.test(&json!({"status": "failed"})).unwrap());
}

#[test]
fn script_file_is_read_per_evaluation() {
    let mut file = tempfile::Builder::new().suffix(".rhai").tempfile().unwrap();
    write!(file, "input.score >= metadata.pass_mark").unwrap();

    let f = filter(json!({
        "script": {
            "interpreter": "Rhai",
            "scriptFile": file.path(),
            "metadata": {"pass_mark": 50}
        }
    }));
    assert!(f.test(&json!({"score": 70})).unwrap());
    assert!(!f.test(&json!({"score": 20})).unwrap());

    std::fs::write(file.path(), "input.score < metadata.pass_mark").unwrap();
    assert!(f.test(&json!({"score": 20})).unwrap());
}

#[cfg(feature = "javascript")]
#[test]
fn javascript_aliases() {
    for interpreter in ["javascript", "js", "ES5"] {
        let f = filter(json!({
            "script": {"interpreter": interpreter, "script": "input.tags.indexOf(metadata.tag) >= 0", "metadata": {"tag": "vip"}}
        }));
        assert!(f.test(&json!({"tags": ["new", "vip"]})).unwrap());
        assert!(!f.test(&json!({"tags": ["new"]})).unwrap());
    }
}

#[test]
fn script_errors_surface_as_filter_errors() {
    let f = filter(json!({"script": {"interpreter": "rhai", "script": "input.n + 1"}}));
    let err = f.test(&json!({"n": 1})).unwrap_err();
    assert!(matches!(err, FilterError::Script(_)));
    assert!(err.to_string().contains("expected a boolean"));
}

#[test]
fn serialization_preserves_behaviour() {
    let original = filter(json!({
        "template": "{{ .kind | lower }}",
        "operator": "IN",
        "value": ["order", "{{ .fallback }}"],
        "requeue": true,
        "and": {"path": "$.amount", "operator": "gte", "value": "10"}
    }));
    let reloaded: Filter = serde_yaml::from_str(&serde_yaml::to_string(&original).unwrap()).unwrap();
    assert_eq!(reloaded, original);

    for msg in [
        json!({"kind": "ORDER", "amount": 12}),
        json!({"kind": "Refund", "fallback": "refund", "amount": 9}),
        json!({"kind": "other", "amount": 50}),
    ] {
        assert_eq!(original.test(&msg).unwrap(), reloaded.test(&msg).unwrap());
    }
}

#[test]
fn gate_from_json_config() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    let config = json!({
        "rules": [
            {"name": "not-expired", "filter": {"path": "$.sent", "operator": "newerThan", "value": "1d"}},
            {"name": "warm", "filter": {"path": "$.cache", "value": "warm", "requeue": true}}
        ]
    });
    write!(file, "{config}").unwrap();

    let gate = GateConfig::from_file(file.path()).unwrap().into_gate();
    assert_eq!(
        gate.decide(&json!({"sent": ago(5), "cache": "warm"})).unwrap(),
        Decision::Accept
    );
    assert_eq!(
        gate.decide(&json!({"sent": ago(5), "cache": "cold"})).unwrap(),
        Decision::Requeue { rule: "warm".to_string() }
    );
    assert_eq!(
        gate.decide(&json!({"sent": ago(60 * 48)})).unwrap(),
        Decision::Reject { rule: "not-expired".to_string() }
    );
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn equal_and_not_equal_are_complementary(subject in scalar(), literal in scalar()) {
        let msg = json!({ "v": subject });
        let eq = filter(json!({"path": "$.v", "operator": "==", "value": literal.clone()}));
        let ne = filter(json!({"path": "$.v", "operator": "!=", "value": literal}));
        prop_assert_ne!(eq.test(&msg).unwrap(), ne.test(&msg).unwrap());
    }

    #[test]
    fn value_always_equals_itself(subject in scalar()) {
        let msg = json!({ "v": subject.clone() });
        let f = filter(json!({"path": "$.v", "value": subject}));
        prop_assert!(f.test(&msg).unwrap());
    }

    #[test]
    fn integers_and_floats_compare_equal(n in -1_000_000i64..1_000_000) {
        let msg = json!({ "v": n });
        let f = filter(json!({"path": "$.v", "value": n as f64}));
        prop_assert!(f.test(&msg).unwrap());
    }

    #[test]
    fn evaluation_is_idempotent(subject in scalar(), literal in scalar()) {
        let msg = json!({ "v": subject });
        let f = filter(json!({"path": "$.v", "operator": "in", "value": [literal, 1, "x"]}));
        let first = f.test(&msg).unwrap();
        prop_assert_eq!(f.test(&msg).unwrap(), first);
    }
}
