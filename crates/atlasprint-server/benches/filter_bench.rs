// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for filter translation and fast-path feature selection.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use atlasprint_expr::{Expression, FeatureRequest};
use atlasprint_layout::{DataProvider, Feature, Field, VectorLayer};
use atlasprint_server::translate;

fn layer(pks: Vec<usize>) -> VectorLayer {
    let features = (0..10_000)
        .map(|id| Feature::new(id).with_attribute("gid", id))
        .collect();
    VectorLayer::new(
        "parcels",
        DataProvider::new(vec![Field::typed("gid", "integer")], pks).with_features(features),
    )
}

fn bench_translate(c: &mut Criterion) {
    let provider = layer(vec![0]).data_provider().clone();
    let filter = Expression::parse("$id = 4242").unwrap();

    c.bench_function("translate $id filter (single pk)", |b| {
        b.iter(|| translate(black_box(&filter), black_box(&provider)))
    });
}

/// Select one feature out of 10k by id, by rewritten pk filter, and by the raw `$id` filter.
fn bench_selection(c: &mut Criterion) {
    let layer = layer(vec![0]);
    let by_fid = FeatureRequest::filter_fid(4242);
    let by_pk = FeatureRequest::filter_expression("\"gid\" IN (4242)").unwrap();
    let by_id_expr = FeatureRequest::filter_expression("$id = 4242").unwrap();

    let mut group = c.benchmark_group("select one of 10k");
    group.bench_function("fid", |b| b.iter(|| layer.get_features(Some(&by_fid)).len()));
    group.bench_function("pk expression", |b| b.iter(|| layer.get_features(Some(&by_pk)).len()));
    group.bench_function("$id expression", |b| {
        b.iter(|| layer.get_features(Some(&by_id_expr)).len())
    });
    group.finish();
}

criterion_group!(benches, bench_translate, bench_selection);
criterion_main!(benches);
