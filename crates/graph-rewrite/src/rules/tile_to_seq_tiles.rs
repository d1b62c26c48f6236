// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Splits a `Tile` that repeats several axes into a chain of single-axis
//! `Tile`s.
//!
//! Only tiles whose `repeats` input is a compile-time constant with more
//! than one entry different from 1 are rewritten. The original node stays
//! last in the chain (keeping its name and output), earlier axes get new
//! `Tile` nodes named `<name>/Tile_<axis>`.

use crate::{Match, NodeMatcher, Pattern, RewriteError, RewriteRule};
use graph_ir::{Attrs, Graph, Node, NodeId};
use shape_core::{DType, PartialShape, TensorValue};

#[derive(Debug, Clone, Copy, Default)]
pub struct TileToSeqTiles;

impl TileToSeqTiles {
    pub fn new() -> Self {
        Self
    }
}

fn constant_repeats(node: &Node<'_>) -> Option<Vec<i64>> {
    node.value()?.to_i64_vec()
}

fn tiled_axes(repeats: &[i64]) -> Vec<usize> {
    repeats
        .iter()
        .enumerate()
        .filter(|&(_, &r)| r != 1)
        .map(|(axis, _)| axis)
        .collect()
}

impl RewriteRule for TileToSeqTiles {
    fn name(&self) -> &str {
        "TileToSeqTiles"
    }

    fn pattern(&self) -> Pattern {
        Pattern::new()
            .node("tile", NodeMatcher::op("Tile"))
            .node("input", NodeMatcher::data())
            .node(
                "repeats",
                NodeMatcher::data().with_predicate(|n| {
                    constant_repeats(n).map_or(false, |r| tiled_axes(&r).len() > 1)
                }),
            )
            .edge_ports("input", "tile", None, Some(0))
            .edge_ports("repeats", "tile", None, Some(1))
    }

    fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError> {
        let tile = m.node("tile")?;
        let input = m.node("input")?;
        let repeats_data = m.node("repeats")?;
        let name = graph.node(tile)?.name().to_string();
        let repeats = constant_repeats(&graph.node(repeats_data)?)
            .ok_or_else(|| RewriteError::InvalidPattern("repeats lost their value".into()))?;
        let axes = tiled_axes(&repeats);
        let Some((&last_axis, leading)) = axes.split_last() else {
            return Ok(());
        };

        graph.disconnect_input(tile, 0)?;
        graph.disconnect_input(tile, 1)?;
        drop_orphan_constant(graph, repeats_data)?;

        let mut prev = input;
        for &axis in leading {
            let step = graph.add_operation_node(format!("{name}/Tile_{axis}"), "Tile", Attrs::new());
            let step_data = graph.add_data_node(format!("{name}/Tile_{axis}:0"), PartialShape::unknown(), None, None);
            let step_repeats = add_repeats(graph, &name, axis, &repeats)?;
            graph.connect(prev, 0, step, 0)?;
            graph.connect(step_repeats, 0, step, 1)?;
            graph.connect(step, 0, step_data, 0)?;
            prev = step_data;
        }

        let last_repeats = add_repeats(graph, &name, last_axis, &repeats)?;
        graph.connect(prev, 0, tile, 0)?;
        graph.connect(last_repeats, 0, tile, 1)?;
        Ok(())
    }
}

/// Adds `Const -> data` holding `repeats` with every axis but `axis` set to 1.
fn add_repeats(graph: &mut Graph, name: &str, axis: usize, repeats: &[i64]) -> Result<NodeId, RewriteError> {
    let single: Vec<i64> = repeats
        .iter()
        .enumerate()
        .map(|(i, &r)| if i == axis { r } else { 1 })
        .collect();
    let value = TensorValue::from_i64(&single);

    let mut attrs = Attrs::new();
    attrs.insert("value".into(), value.clone().into());
    let konst = graph.add_operation_node(format!("{name}/repeats_{axis}"), "Const", attrs);
    let data = graph.add_data_node(
        format!("{name}/repeats_{axis}:0"),
        PartialShape::static_shape(&[single.len() as u64]),
        Some(value),
        Some(DType::I64),
    );
    graph.connect(konst, 0, data, 0)?;
    Ok(data)
}

/// Removes a data node nothing consumes any more, together with a `Const`
/// producer that has no other outputs.
fn drop_orphan_constant(graph: &mut Graph, data: NodeId) -> Result<(), RewriteError> {
    if !graph.consumers_of(data)?.is_empty() {
        return Ok(());
    }
    let producer = graph.producer_of(data)?;
    graph.remove_node(data, true)?;
    if let Some((op, _)) = producer {
        let node = graph.node(op)?;
        if node.op() == Some("Const") && node.out_degree() == 0 {
            graph.remove_node(op, true)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_graph(repeats: &[i64]) -> Graph {
        graph_ir::GraphBuilder::new("tile")
            .data("x").shape(&[2, 3, 4])
            .op("reps", "Const")
            .data("reps_data").value(TensorValue::from_i64(repeats)).shape(&[repeats.len() as i64])
            .op("tile", "Tile")
            .data("y")
            .op("out", "Result")
            .chain(&["reps", "reps_data"])
            .edge_ports("x", "tile", 0, 0)
            .edge_ports("reps_data", "tile", 0, 1)
            .chain(&["tile", "y", "out"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_splits_into_chain() {
        let mut g = tile_graph(&[2, 1, 3]);
        let report = TileToSeqTiles.find_and_replace_pattern(&mut g).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(g.nodes_by_op("Tile").len(), 2);

        // The old repeats are gone; each tile has single-axis repeats.
        assert!(g.find_by_name("reps_data").is_none());
        assert!(g.find_by_name("reps").is_none());
        let tile = g.node_by_name("tile").unwrap();
        let reps = g.in_data(tile, 1).unwrap().unwrap();
        assert_eq!(g.node(reps).unwrap().value().and_then(TensorValue::to_i64_vec), Some(vec![1, 1, 3]));

        let first = g.node_by_name("tile/Tile_0").unwrap();
        let first_reps = g.in_data(first, 1).unwrap().unwrap();
        assert_eq!(
            g.node(first_reps).unwrap().value().and_then(TensorValue::to_i64_vec),
            Some(vec![2, 1, 1])
        );
        let x = g.node_by_name("x").unwrap();
        assert_eq!(g.in_data(first, 0).unwrap(), Some(x));

        // Output wiring is untouched.
        let y = g.node_by_name("y").unwrap();
        assert_eq!(g.producer_of(y).unwrap(), Some((tile, 0)));
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_single_axis_does_not_match() {
        for repeats in [&[1i64, 1, 1][..], &[1i64, 4, 1][..]] {
            let mut g = tile_graph(repeats);
            let report = TileToSeqTiles.find_and_replace_pattern(&mut g).unwrap();
            assert_eq!(report.matches, 0, "{repeats:?}");
        }
    }

    #[test]
    fn test_non_constant_repeats_do_not_match() {
        let mut g = graph_ir::GraphBuilder::new("tile")
            .data("x").shape(&[2, 3])
            .data("r").shape(&[2])
            .op("tile", "Tile")
            .data("y")
            .edge_ports("x", "tile", 0, 0)
            .edge_ports("r", "tile", 0, 1)
            .edge("tile", "y")
            .build()
            .unwrap();
        assert_eq!(TileToSeqTiles.find_and_replace_pattern(&mut g).unwrap().matches, 0);
    }
}
