//! Rule files and message streams read from disk.

use msgfilter::GateConfig;
use msgfilter_cli::{check_stream, OutputFormat};
use std::fs::File;
use std::io::{BufReader, Write};

fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn rule_file_checks_ndjson_file() {
    let rules = temp_file(
        ".yaml",
        r#"
rules:
  - name: kind
    filter:
      path: $.kind
      operator: in
      value: [order, refund]
  - name: amount
    filter:
      path: $.amount
      operator: ">"
      value: 0
      requeue: true
"#,
    );
    let messages = temp_file(
        ".ndjson",
        concat!(
            "{\"kind\": \"order\", \"amount\": 5}\n",
            "\n",
            "{\"kind\": \"refund\", \"amount\": 0}\n",
            "{\"kind\": \"ping\"}\n",
            "not json\n",
        ),
    );

    let gate = GateConfig::from_file(rules.path()).unwrap().into_gate();
    let input = BufReader::new(File::open(messages.path()).unwrap());
    let mut out = Vec::new();
    let summary = check_stream(&gate, input, &mut out, OutputFormat::Text).unwrap();

    assert_eq!(summary.messages, 4);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.requeued, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.errors, 1);

    let report = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "line 1: accept");
    assert_eq!(lines[1], "line 3: requeue (rule 'amount')");
    assert_eq!(lines[2], "line 4: reject (rule 'kind')");
    assert!(lines[3].starts_with("line 5: error"));
}

#[test]
fn json_rule_file_by_extension() {
    let rules = temp_file(
        ".json",
        r#"{"rules": [{"name": "paid", "filter": {"path": "status", "value": "paid"}}]}"#,
    );
    let gate = GateConfig::from_file(rules.path()).unwrap().into_gate();

    let mut out = Vec::new();
    let summary = check_stream(
        &gate,
        "{\"status\": \"paid\"}\n".as_bytes(),
        &mut out,
        OutputFormat::Json,
    )
    .unwrap();

    assert_eq!(summary.accepted, 1);
    let outcome: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(outcome["line"], 1);
}
