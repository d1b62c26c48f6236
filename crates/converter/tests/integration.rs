// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: description → rewrite rules → shape inference.

use converter::{convert, ConvertError, Converter, ConverterConfig, Stage};
use graph_ir::{Graph, GraphDescription};
use graph_rewrite::{Match, NodeMatcher, Pattern, RewriteError, RewriteRule};
use shape_core::{DType, Dim, PartialShape};

// ── Helpers ────────────────────────────────────────────────────

/// `x[-1, 3] -> Where -> Tile(repeats [2, 3]) -> MatMul(w[3, 4]) -> Result`.
fn pipeline_json() -> &'static str {
    r#"{
        "name": "pipeline",
        "nodes": [
            { "kind": "op", "name": "x", "op": "Parameter", "attrs": { "shape": [-1, 3] } },
            { "kind": "data", "name": "x_data" },
            { "kind": "op", "name": "where", "op": "Where" },
            { "kind": "data", "name": "where_data" },
            { "kind": "op", "name": "reps", "op": "Const" },
            { "kind": "data", "name": "reps_data", "shape": [2],
              "value": { "shape": [2], "data": [2, 3] }, "data_type": "i64" },
            { "kind": "op", "name": "tile", "op": "Tile" },
            { "kind": "data", "name": "tile_data" },
            { "kind": "op", "name": "w", "op": "Parameter", "attrs": { "shape": [6, 4] } },
            { "kind": "data", "name": "w_data" },
            { "kind": "op", "name": "mm", "op": "MatMul" },
            { "kind": "data", "name": "mm_data" },
            { "kind": "op", "name": "out", "op": "Result" }
        ],
        "edges": [
            { "src": "x", "dst": "x_data" },
            { "src": "x_data", "dst": "where" },
            { "src": "where", "dst": "where_data" },
            { "src": "reps", "dst": "reps_data" },
            { "src": "where_data", "dst": "tile", "in": 0 },
            { "src": "reps_data", "dst": "tile", "in": 1 },
            { "src": "tile", "dst": "tile_data" },
            { "src": "w", "dst": "w_data" },
            { "src": "tile_data", "dst": "mm", "in": 0 },
            { "src": "w_data", "dst": "mm", "in": 1 },
            { "src": "mm", "dst": "mm_data" },
            { "src": "mm_data", "dst": "out" }
        ]
    }"#
}

fn pipeline() -> Graph {
    GraphDescription::from_json(pipeline_json()).unwrap().build().unwrap()
}

fn shape_of(graph: &Graph, name: &str) -> PartialShape {
    let id = graph.node_by_name(name).unwrap();
    graph.node(id).unwrap().shape().cloned().unwrap_or_default()
}

// ── Tests ──────────────────────────────────────────────────────

#[test]
fn test_end_to_end_default_config() {
    let output = convert(pipeline(), ConverterConfig::default()).unwrap();
    let report = &output.report;
    assert!(report.is_clean(), "{}", report.summary());
    assert_eq!(report.rules.len(), 2);
    assert_eq!(report.rules[0].applied, 1);
    assert_eq!(report.rules[1].applied, 1);

    let g = &output.graph;
    assert!(g.nodes_by_op("Where").is_empty());
    assert_eq!(g.nodes_by_op("NonZero").len(), 1);
    assert_eq!(g.nodes_by_op("Tile").len(), 2);
    assert!(g.stale_nodes().is_empty());

    // Where: [-1, 2]; tiled by [2, 3]: [-1, 6]; @ [6, 4]: [-1, 4].
    assert_eq!(shape_of(g, "where_data"), PartialShape::from_dims([Dim::Dynamic, Dim::Static(2)]));
    assert_eq!(shape_of(g, "tile_data"), PartialShape::from_dims([Dim::Dynamic, Dim::Static(6)]));
    assert_eq!(shape_of(g, "mm_data"), PartialShape::from_dims([Dim::Dynamic, Dim::Static(4)]));

    let where_data = g.node(g.node_by_name("where_data").unwrap()).unwrap();
    assert_eq!(where_data.data_type(), Some(DType::I64));
}

#[test]
fn test_shapes_match_unconverted_inference() {
    let config = ConverterConfig {
        rules: Vec::new(),
        ..Default::default()
    };
    let plain = convert(pipeline(), config).unwrap();
    let converted = convert(pipeline(), ConverterConfig::default()).unwrap();
    for name in ["where_data", "tile_data", "mm_data"] {
        assert_eq!(shape_of(&plain.graph, name), shape_of(&converted.graph, name), "{name}");
    }
}

#[test]
fn test_inference_failure_is_recorded_once() {
    let mut g = pipeline();
    let w = g.node_by_name("w").unwrap();
    g.set_attr(w, "shape", vec![5i64, 4]).unwrap();

    let output = convert(g, ConverterConfig::default()).unwrap();
    let failures = &output.report.failures;
    assert_eq!(failures.len(), 1, "{}", output.report.summary());
    assert_eq!(failures[0].stage, Stage::Inference);
    assert_eq!(failures[0].node, "mm");
    assert_eq!(failures[0].source, "MatMul");
    assert_eq!(failures[0].kind, "ShapeInference");
    // The rules still ran, and mm was retried by every inference run.
    assert_eq!(output.report.total_rewrites(), 2);
    assert!(output.report.inference.runs >= 3);
}

#[test]
fn test_abort_on_error_escalates() {
    let mut g = pipeline();
    let w = g.node_by_name("w").unwrap();
    g.set_attr(w, "shape", vec![5i64, 4]).unwrap();

    let config = ConverterConfig {
        abort_on_error: true,
        ..Default::default()
    };
    let err = convert(g, config).unwrap_err();
    match err {
        ConvertError::PassFailed(failure) => {
            assert_eq!(failure.stage, Stage::Inference);
            assert_eq!(failure.node, "mm");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Always fails after touching the graph.
struct Sabotage;

impl RewriteRule for Sabotage {
    fn name(&self) -> &str {
        "Sabotage"
    }

    fn pattern(&self) -> Pattern {
        Pattern::new().node("mm", NodeMatcher::op("MatMul"))
    }

    fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError> {
        let mm = m.node("mm")?;
        graph.set_attr(mm, "transpose_b", true)?;
        Err(RewriteError::InvalidPattern("sabotaged".into()))
    }
}

#[test]
fn test_rewrite_failure_rolls_back_and_continues() {
    let output = Converter::new(ConverterConfig::default())
        .unwrap()
        .with_rules(vec![Box::new(Sabotage)])
        .load(pipeline())
        .run()
        .unwrap();
    let failures = &output.report.failures;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].stage, Stage::Rewrite);
    assert_eq!(failures[0].source, "Sabotage");
    assert_eq!(failures[0].node, "mm");

    let mm = output.graph.node_by_name("mm").unwrap();
    assert!(output.graph.node(mm).unwrap().attr("transpose_b").is_none());
}

#[test]
fn test_rewrite_failure_with_abort_on_error() {
    let config = ConverterConfig {
        abort_on_error: true,
        ..Default::default()
    };
    let err = Converter::new(config)
        .unwrap()
        .with_rules(vec![Box::new(Sabotage)])
        .load(pipeline())
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::RewriteError(RewriteError::RewriteFailed { ref rule, .. }) if rule == "Sabotage"
    ));
}

#[test]
fn test_config_from_toml_drives_rules() {
    let config = ConverterConfig::from_toml(r#"rules = ["WhereDecomposition"]"#).unwrap();
    let output = convert(pipeline(), config).unwrap();
    assert_eq!(output.report.rules.len(), 1);
    assert_eq!(output.graph.nodes_by_op("Tile").len(), 1);
}

#[test]
fn test_report_serialises() {
    let output = convert(pipeline(), ConverterConfig::default()).unwrap();
    let json = output.report.to_json().unwrap();
    assert!(json.contains("\"WhereDecomposition\""));
    assert!(json.contains("\"TileToSeqTiles\""));
    let description = output.graph.to_description().to_json().unwrap();
    let rebuilt = GraphDescription::from_json(&description).unwrap().build().unwrap();
    assert_eq!(rebuilt.node_count(), output.graph.node_count());
}
