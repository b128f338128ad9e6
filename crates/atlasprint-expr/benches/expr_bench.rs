// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for filter expression parsing and evaluation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Map, Value, json};

use atlasprint_expr::{EvalContext, Expression};

const FILTER: &str = "\"commune\" ILIKE 'saint-%' AND (\"surface\" >= 1200 OR $id IN (3, 5, 8))";

struct Row {
    id: i64,
    attrs: Map<String, Value>,
}

impl EvalContext for Row {
    fn feature_id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse compound filter", |b| {
        b.iter(|| black_box(Expression::parse(black_box(FILTER))))
    });
}

/// Evaluate against 1000 rows, roughly half of which match.
fn bench_evaluate(c: &mut Criterion) {
    let expr = Expression::parse(FILTER).unwrap();
    let rows: Vec<Row> = (0..1000)
        .map(|i| {
            let name = if i % 2 == 0 { "Saint-Malo" } else { "Rennes" };
            let Value::Object(attrs) = json!({"commune": name, "surface": i * 3}) else {
                unreachable!()
            };
            Row { id: i, attrs }
        })
        .collect();

    c.bench_function("evaluate filter (1000 rows)", |b| {
        b.iter(|| rows.iter().filter(|r| expr.matches(*r)).count())
    });
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
