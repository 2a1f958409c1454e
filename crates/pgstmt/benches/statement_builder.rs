use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgstmt::{
    Column, Condition, NumberOperation, OrderDirection, QueryOptions, StatementBuilder,
    TextOperation,
};

/// `n` ANDed number comparisons, each with a distinct literal.
fn distinct_condition(n: usize) -> Condition {
    Condition::and((0..n).map(|i| {
        Condition::number(
            Column::new("t", format!("col{i}")),
            NumberOperation::Equal,
            i as i64,
        )
    }))
}

/// `n` ORed text comparisons that all bind the same literal.
fn repeated_condition(n: usize) -> Condition {
    Condition::or((0..n).map(|i| {
        Condition::text(
            Column::new("t", format!("col{i}")),
            TextOperation::Equal,
            "same",
        )
    }))
}

fn render(condition: &Condition) -> String {
    let options = QueryOptions::new()
        .condition(condition.clone())
        .order_by(Column::new("t", "col0"), OrderDirection::Descending)
        .limit(50)
        .offset(100);
    let mut builder = StatementBuilder::new("SELECT * FROM t");
    options.write(&mut builder);
    builder.build().sql
}

fn bench_distinct_args(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/distinct_args");

    for n in [1, 5, 10, 50, 100] {
        let condition = distinct_condition(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &condition, |b, condition| {
            b.iter(|| black_box(render(condition)));
        });
    }

    group.finish();
}

fn bench_repeated_args(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_builder/repeated_args");

    for n in [1, 5, 10, 50, 100] {
        let condition = repeated_condition(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &condition, |b, condition| {
            b.iter(|| black_box(render(condition)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_distinct_args, bench_repeated_args);
criterion_main!(benches);
