use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use matchcast::{
    Evaluator, Expression, Item, Job, Listener, Record, Router, RouterConfig, Spawner, Value,
};

/// Runs deliveries on the calling thread so the numbers measure matching, not thread startup.
struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, job: Job) {
        job();
    }
}

fn msg(age: i64) -> Item {
    let detail = Record::new("Detail").with_aliased("Age", [("json", "age")], age);
    let msg = Record::new("Msg")
        .with("Name", "ok")
        .with_aliased("Detail", [("json", "detail")], detail);
    Arc::new(msg.into())
}

fn nested_expression() -> Expression {
    Expression::new()
        .field("Name", Expression::new().equals("ok"))
        .field("detail.age", Expression::new().gt(18).lt(31))
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.throughput(Throughput::Elements(1));

    let evaluator = Evaluator::with_alias_key("json");
    let expr = nested_expression();
    let hit = msg(22);
    let miss = msg(40);

    group.bench_function("nested_hit", |b| b.iter(|| evaluator.matches(&expr, &hit)));
    group.bench_function("nested_miss", |b| b.iter(|| evaluator.matches(&expr, &miss)));

    let scalar = Expression::new().gte(10).lte(20);
    let value = Value::Float(15.5);
    group.bench_function("scalar_range", |b| b.iter(|| evaluator.matches(&scalar, &value)));

    group.finish();
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for consumers in [1usize, 16, 256] {
        group.throughput(Throughput::Elements(consumers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(consumers), &consumers, |b, &n| {
            b.iter_custom(|iters| {
                // Fresh router per sample so registrations do not accumulate.
                let router = Router::new(RouterConfig::default().with_alias_key("json"))
                    .with_spawner(Arc::new(InlineSpawner));
                for i in 0..n {
                    let expr = if i % 2 == 0 {
                        nested_expression()
                    } else {
                        Expression::new().field("Name", Expression::new().equals("ok"))
                    };
                    router.select(expr, Arc::new(Listener::noop())).unwrap();
                }

                let item = msg(22);
                let start = Instant::now();
                for _ in 0..iters {
                    router.input(Arc::clone(&item)).unwrap();
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

criterion_group!(dispatch, bench_evaluate, bench_broadcast);
criterion_main!(dispatch);
