// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the MatMul shape rule and whole-graph inference.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graph_ir::{Attrs, Graph};
use shape_core::PartialShape;
use shape_infer::{infer_graph, matmul_shape, InferenceRegistry};

fn bench_matmul_shape(c: &mut Criterion) {
    let a = PartialShape::static_shape(&[8, 5, 10, 1024]);
    let b = PartialShape::static_shape(&[1, 1024, 1000]);
    c.bench_function("matmul_shape/batched", |bench| {
        bench.iter(|| matmul_shape(black_box(&a), black_box(&b), false, false))
    });
}

/// A chain of `depth` square MatMuls fed by one Parameter.
fn matmul_chain(depth: usize) -> Graph {
    let mut g = Graph::new("chain");
    let mut attrs = Attrs::new();
    attrs.insert("shape".into(), vec![4i64, 64, 64].into());
    let input = g.add_operation_node("input", "Parameter", attrs);
    let mut prev = g.add_data_node("input_data", PartialShape::unknown(), None, None);
    let _ = g.connect(input, 0, prev, 0);

    for i in 0..depth {
        let w = g.add_data_node(format!("w{i}"), PartialShape::static_shape(&[64, 64]), None, None);
        let mm = g.add_operation_node(format!("mm{i}"), "MatMul", Attrs::new());
        let out = g.add_data_node(format!("mm{i}_data"), PartialShape::unknown(), None, None);
        let _ = g.connect(prev, 0, mm, 0);
        let _ = g.connect(w, 0, mm, 1);
        let _ = g.connect(mm, 0, out, 0);
        prev = out;
    }
    g
}

fn bench_infer_graph(c: &mut Criterion) {
    let registry = InferenceRegistry::with_default_ops();
    let mut group = c.benchmark_group("infer_graph");
    for depth in [16usize, 128] {
        let graph = matmul_chain(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &graph, |bench, graph| {
            bench.iter(|| {
                let mut g = graph.clone();
                infer_graph(&mut g, &registry)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_matmul_shape, bench_infer_graph);
criterion_main!(benches);
