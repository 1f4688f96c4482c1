use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use msgfilter::{Evaluator, Filter, GateConfig};
use serde_json::{json, Value};

fn message(i: usize) -> Value {
    json!({
        "id": i,
        "kind": if i % 2 == 0 { "order" } else { "refund" },
        "amount": (i * 7) % 500,
        "customer": {"region": "eu", "tier": "gold"},
        "items": [{"sku": "a-1", "qty": 2}, {"sku": "b-2", "qty": 1}],
    })
}

fn filter(value: Value) -> Filter {
    serde_json::from_value(value).unwrap()
}

fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");
    let evaluator = Evaluator::default();
    let msg = message(42);

    let cases = [
        ("equal", json!({"path": "$.kind", "value": "order"})),
        ("in", json!({"path": "$.customer.region", "operator": "in", "value": ["us", "eu"]})),
        ("ordering", json!({"path": "$.amount", "operator": ">", "value": 100})),
        ("regex", json!({"path": "$.items[0].sku", "operator": "regexMatch", "value": "^a-\\d+$"})),
        ("template", json!({"template": "{{ .customer.tier | upper }}", "value": "GOLD"})),
    ];

    for (name, doc) in cases {
        let filter = filter(doc);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &filter, |b, filter| {
            b.iter(|| evaluator.test(black_box(filter), black_box(&msg)))
        });
    }

    group.finish();
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("and_chain");
    let evaluator = Evaluator::default();
    let msg = message(7);

    for depth in [1, 4, 16] {
        let mut chain = filter(json!({"path": "$.customer.region", "value": "eu"}));
        for _ in 1..depth {
            chain = filter(json!({"path": "$.customer.tier", "value": "gold"})).with_and(chain);
        }
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &chain, |b, chain| {
            b.iter(|| evaluator.test(black_box(chain), black_box(&msg)))
        });
    }

    group.finish();
}

fn bench_script(c: &mut Criterion) {
    let mut group = c.benchmark_group("script");
    let evaluator = Evaluator::default();
    let msg = message(3);
    let filter = filter(json!({
        "script": {"interpreter": "rhai", "script": "input.amount < 400 && input.kind == \"refund\""}
    }));

    group.bench_function("rhai", |b| {
        b.iter(|| evaluator.test(black_box(&filter), black_box(&msg)))
    });
    group.finish();
}

fn bench_gate(c: &mut Criterion) {
    let gate = GateConfig::from_yaml_str(
        r#"
rules:
  - name: kind
    filter: {path: $.kind, operator: in, value: [order, refund]}
  - name: amount
    filter: {path: $.amount, operator: "<", value: 1000, requeue: true}
  - name: region
    filter: {template: "{{ .customer.region }}", value: eu}
"#,
    )
    .unwrap()
    .into_gate();
    let messages: Vec<Value> = (0..100).map(message).collect();

    let mut group = c.benchmark_group("gate");
    group.throughput(Throughput::Elements(messages.len() as u64));
    group.bench_function("decide_100", |b| {
        b.iter(|| {
            for msg in &messages {
                let _ = black_box(gate.decide(black_box(msg)));
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_operators,
    bench_chain_depth,
    bench_script,
    bench_gate
);
criterion_main!(benches);
