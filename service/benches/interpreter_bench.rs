//! Benchmarks for the `go(ast) -> Parser` dispatch: memoized re-entry cost
//! and decode throughput against nested struct/array schemas of varying
//! depth and width.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use schema_core::ast::Ast;
use schema_core::combinators::{array, struct_};
use schema_core::{ParseOptions, Value};
use schema_interpreter::interpreter::{go, Direction, ParserOutcome};
use schema_interpreter::decode_unknown;
use std::sync::Arc;

fn ready(outcome: ParserOutcome) -> Result<Option<Value>, schema_core::Issue> {
    match outcome {
        ParserOutcome::Ready(r) => r,
        ParserOutcome::Pending(_) => panic!("interpreter benchmarks only exercise synchronous schemas"),
    }
}

/// A struct with `width` string-typed properties, nested `depth` levels
/// deep under a single "child" property at each level.
fn nested_struct(width: usize, depth: usize) -> Arc<Ast> {
    let mut fields: Vec<(&'static str, Arc<Ast>)> = (0..width)
        .map(|i| -> (&'static str, Arc<Ast>) {
            let name: &'static str = Box::leak(format!("field_{i}").into_boxed_str());
            (name, Arc::new(Ast::string_kw()))
        })
        .collect();

    if depth > 0 {
        fields.push(("child", nested_struct(width, depth - 1)));
    }

    Arc::new(struct_(fields))
}

fn matching_value(width: usize, depth: usize) -> Value {
    let mut m = indexmap::IndexMap::new();
    for i in 0..width {
        m.insert(
            schema_core::Key::from(format!("field_{i}")),
            Value::Str("x".to_string()),
        );
    }
    if depth > 0 {
        m.insert(schema_core::Key::from("child"), matching_value(width, depth - 1));
    }
    Value::Map(m)
}

fn bench_go_memo_reentry(c: &mut Criterion) {
    let mut group = c.benchmark_group("go_memo_reentry");
    let schema = nested_struct(10, 5);

    group.bench_function("repeated_go_on_same_ast", |b| {
        b.iter(|| {
            let parser = go(black_box(&schema), Direction::Decode);
            black_box(parser);
        });
    });

    group.finish();
}

fn bench_decode_nested_struct(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_nested_struct");

    for depth in [1usize, 5, 10, 20] {
        let schema = nested_struct(5, depth);
        let value = matching_value(5, depth);

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let result = ready(decode_unknown(
                    black_box(&schema),
                    black_box(Some(value.clone())),
                    ParseOptions::default(),
                ));
                black_box(result.expect("schema matches the generated value"));
            });
        });
    }

    group.finish();
}

fn bench_decode_wide_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_wide_array");

    for len in [10usize, 100, 1000] {
        let schema = Arc::new(array(Arc::new(Ast::number_kw())));
        let value = Value::Seq((0..len).map(|i| Value::Num(i as f64)).collect());

        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                let result = ready(decode_unknown(
                    black_box(&schema),
                    black_box(Some(value.clone())),
                    ParseOptions::default(),
                ));
                black_box(result.expect("homogeneous array decodes"));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_go_memo_reentry,
    bench_decode_nested_struct,
    bench_decode_wide_array
);
criterion_main!(benches);
