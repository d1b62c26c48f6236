// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Structural graph equivalence.
//!
//! [`compare_graphs`] walks two graphs backward from a named node and pairs
//! nodes by their structural role: kind, operation, type label, attributes,
//! input-port layout and degree. Node ids and names (other than the start
//! node) play no part, so a rewritten graph can be checked against a
//! hand-built reference.
//!
//! Data nodes are compared leniently: shapes only when both are ranked, and
//! values or element types only when both sides carry them.
//!
//! Every check is symmetric, so `compare_graphs(a, b, ..)` and
//! `compare_graphs(b, a, ..)` always agree on equality.

use crate::{Edge, Graph, GraphError, Node, NodeId, NodeKind};
use std::collections::{HashMap, VecDeque};

/// Knobs for [`compare_graphs_with`].
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Compare data node shapes (when both are ranked).
    pub check_shapes: bool,
    /// Compare attribute maps.
    pub check_attrs: bool,
    /// Attribute keys excluded from comparison.
    pub ignored_attrs: Vec<String>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            check_shapes: true,
            check_attrs: true,
            ignored_attrs: Vec::new(),
        }
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub equal: bool,
    /// Empty when equal, otherwise the first divergence found.
    pub message: String,
}

impl Comparison {
    fn equal() -> Self {
        Self {
            equal: true,
            message: String::new(),
        }
    }

    fn differ(message: String) -> Self {
        Self {
            equal: false,
            message,
        }
    }
}

/// Compares two graphs starting from the node named `output` in each.
///
/// # Errors
/// [`GraphError::NodeNotFound`] if either graph lacks `output`.
pub fn compare_graphs(a: &Graph, b: &Graph, output: &str) -> Result<Comparison, GraphError> {
    compare_graphs_with(a, b, output, &CompareOptions::default())
}

/// [`compare_graphs`] with explicit options.
pub fn compare_graphs_with(
    a: &Graph,
    b: &Graph,
    output: &str,
    options: &CompareOptions,
) -> Result<Comparison, GraphError> {
    let start_a = a.node_by_name(output)?;
    let start_b = b.node_by_name(output)?;

    let mut a_to_b: HashMap<NodeId, NodeId> = HashMap::from([(start_a, start_b)]);
    let mut b_to_a: HashMap<NodeId, NodeId> = HashMap::from([(start_b, start_a)]);
    let mut queue = VecDeque::from([(start_a, start_b)]);

    while let Some((ia, ib)) = queue.pop_front() {
        let na = a.node(ia)?;
        let nb = b.node(ib)?;
        if let Some(diff) = compare_nodes(&na, &nb, options) {
            return Ok(Comparison::differ(diff));
        }

        let ea = sorted_in_edges(a, ia)?;
        let eb = sorted_in_edges(b, ib)?;
        for (x, y) in ea.iter().zip(&eb) {
            if (x.src_port, x.dst_port) != (y.src_port, y.dst_port) {
                return Ok(Comparison::differ(format!(
                    "'{}' and '{}': input edge ports differ ({} -> {} vs {} -> {})",
                    na.name(),
                    nb.name(),
                    x.src_port,
                    x.dst_port,
                    y.src_port,
                    y.dst_port,
                )));
            }
            let paired_b = a_to_b.get(&x.src).copied();
            let paired_a = b_to_a.get(&y.src).copied();
            match (paired_b, paired_a) {
                (None, None) => {
                    a_to_b.insert(x.src, y.src);
                    b_to_a.insert(y.src, x.src);
                    queue.push_back((x.src, y.src));
                }
                (Some(pb), Some(pa)) if pb == y.src && pa == x.src => {}
                _ => {
                    return Ok(Comparison::differ(format!(
                        "inputs of '{}' and '{}' are wired to different nodes",
                        na.name(),
                        nb.name(),
                    )));
                }
            }
        }
    }

    Ok(Comparison::equal())
}

fn sorted_in_edges(graph: &Graph, id: NodeId) -> Result<Vec<Edge>, GraphError> {
    let mut edges: Vec<Edge> = graph.in_edges(id)?.into_iter().map(|(_, e)| e).collect();
    edges.sort_by_key(|e| (e.dst_port, e.src_port));
    Ok(edges)
}

fn compare_nodes(a: &Node<'_>, b: &Node<'_>, options: &CompareOptions) -> Option<String> {
    let pair = || format!("'{}' and '{}'", a.name(), b.name());

    match (a.kind(), b.kind()) {
        (NodeKind::Op(x), NodeKind::Op(y)) => {
            if x.op != y.op {
                return Some(format!("{}: op {} vs {}", pair(), x.op, y.op));
            }
            if let (Some(tx), Some(ty)) = (&x.op_type, &y.op_type) {
                if tx != ty {
                    return Some(format!("{}: type {tx} vs {ty}", pair()));
                }
            }
        }
        (NodeKind::Data(x), NodeKind::Data(y)) => {
            if options.check_shapes && x.shape.is_ranked() && y.shape.is_ranked() && x.shape != y.shape {
                return Some(format!("{}: shape {} vs {}", pair(), x.shape, y.shape));
            }
            if let (Some(vx), Some(vy)) = (&x.value, &y.value) {
                if vx != vy {
                    return Some(format!("{}: value {vx} vs {vy}", pair()));
                }
            }
            if let (Some(tx), Some(ty)) = (x.data_type, y.data_type) {
                if tx != ty {
                    return Some(format!("{}: data type {tx} vs {ty}", pair()));
                }
            }
        }
        (kx, ky) => {
            return Some(format!("{}: kind {} vs {}", pair(), kx.as_str(), ky.as_str()));
        }
    }

    if options.check_attrs {
        let keys = a.attrs().keys().chain(b.attrs().keys());
        for key in keys.filter(|k| !options.ignored_attrs.iter().any(|i| i == *k)) {
            let (va, vb) = (a.attr(key), b.attr(key));
            if va != vb {
                let show = |v: Option<&crate::AttrValue>| v.map_or("<absent>".to_string(), |v| v.to_string());
                return Some(format!(
                    "{}: attribute '{key}' is {} vs {}",
                    pair(),
                    show(va),
                    show(vb)
                ));
            }
        }
    }

    if a.in_degree() != b.in_degree() || a.out_degree() != b.out_degree() {
        return Some(format!(
            "{}: degree (in {}, out {}) vs (in {}, out {})",
            pair(),
            a.in_degree(),
            a.out_degree(),
            b.in_degree(),
            b.out_degree(),
        ));
    }
    None
}
