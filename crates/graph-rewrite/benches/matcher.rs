// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for pattern matching and rule application.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use graph_ir::{Attrs, Graph};
use graph_rewrite::{find_matches, RewriteRule, WhereDecomposition};
use shape_core::PartialShape;

/// `width` independent `Parameter -> Where -> Result` branches.
fn where_forest(width: usize) -> Graph {
    let mut g = Graph::new("forest");
    for i in 0..width {
        let param = g.add_operation_node(format!("p{i}"), "Parameter", Attrs::new());
        let x = g.add_data_node(format!("x{i}"), PartialShape::static_shape(&[8, 8]), None, None);
        let w = g.add_operation_node(format!("w{i}"), "Where", Attrs::new());
        let y = g.add_data_node(format!("y{i}"), PartialShape::unknown(), None, None);
        let out = g.add_operation_node(format!("out{i}"), "Result", Attrs::new());
        for (src, dst) in [(param, x), (x, w), (w, y), (y, out)] {
            let _ = g.connect(src, 0, dst, 0);
        }
    }
    g
}

fn bench_find_matches(c: &mut Criterion) {
    let pattern = WhereDecomposition.pattern();
    let mut group = c.benchmark_group("find_matches");
    for width in [10usize, 100, 1000] {
        let graph = where_forest(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &graph, |b, graph| {
            b.iter(|| find_matches(graph, &pattern).count())
        });
    }
    group.finish();
}

fn bench_where_decomposition(c: &mut Criterion) {
    let graph = where_forest(100);
    c.bench_function("where_decomposition/100", |b| {
        b.iter_batched(
            || graph.clone(),
            |mut g| WhereDecomposition.find_and_replace_pattern(&mut g),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_find_matches, bench_where_decomposition);
criterion_main!(benches);
