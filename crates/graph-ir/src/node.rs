// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node identifiers, node payloads and the borrowed [`Node`] accessor.
//!
//! A [`NodeId`] is the non-owning handle callers hold on to. It stays
//! `Copy` and cheap, and every graph operation that receives one checks that
//! the node still exists, failing with [`GraphError::StaleHandle`] otherwise.
//! A [`Node`] is obtained from a live id and borrows the graph, so while it
//! exists the node cannot be removed.

use crate::{AttrValue, Attrs, Graph, GraphError};
use shape_core::{DType, PartialShape, TensorValue};
use std::fmt;

/// Opaque handle to a node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in insertion order.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to an edge in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A directed edge between an operation node and a data node.
///
/// For operation → data edges `src_port` is the operation's output index
/// and `dst_port` is 0. For data → operation edges `src_port` is 0 and
/// `dst_port` is the operation's input index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: NodeId,
    pub src_port: usize,
    pub dst: NodeId,
    pub dst_port: usize,
}

/// Payload of an operation node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpNode {
    /// Operation kind; the key into the shape-inference registry.
    pub op: String,
    /// Presentation-layer type label (e.g. the target engine's op name).
    pub op_type: Option<String>,
}

/// Payload of a data (tensor) node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataNode {
    pub shape: PartialShape,
    /// Present only for compile-time constant data.
    pub value: Option<TensorValue>,
    pub data_type: Option<DType>,
}

/// Whether a node is an operation or a data node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Op(OpNode),
    Data(DataNode),
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Op(_) => "op",
            NodeKind::Data(_) => "data",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeSlot {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) attrs: Attrs,
    pub(crate) in_edges: Vec<EdgeId>,
    pub(crate) out_edges: Vec<EdgeId>,
    pub(crate) stale: bool,
}

/// Borrowed, read-only view of a live node.
///
/// # Example
/// ```
/// use graph_ir::{Graph, Attrs};
///
/// let mut graph = Graph::new("demo");
/// let id = graph.add_operation_node("mm", "MatMul", Attrs::new());
/// let node = graph.node(id).unwrap();
/// assert_eq!(node.op(), Some("MatMul"));
/// assert!(!node.has_and_set("transpose_a"));
/// ```
#[derive(Clone, Copy)]
pub struct Node<'g> {
    pub(crate) graph: &'g Graph,
    pub(crate) id: NodeId,
    pub(crate) slot: &'g NodeSlot,
}

impl<'g> Node<'g> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'g str {
        &self.slot.name
    }

    pub fn kind(&self) -> &'g NodeKind {
        &self.slot.kind
    }

    pub fn is_op(&self) -> bool {
        matches!(self.slot.kind, NodeKind::Op(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self.slot.kind, NodeKind::Data(_))
    }

    /// Operation kind, or `None` for data nodes.
    pub fn op(&self) -> Option<&'g str> {
        match &self.slot.kind {
            NodeKind::Op(op) => Some(&op.op),
            NodeKind::Data(_) => None,
        }
    }

    /// Presentation type label, if set.
    pub fn op_type(&self) -> Option<&'g str> {
        match &self.slot.kind {
            NodeKind::Op(op) => op.op_type.as_deref(),
            NodeKind::Data(_) => None,
        }
    }

    /// Data payload, or `None` for operation nodes.
    pub fn data(&self) -> Option<&'g DataNode> {
        match &self.slot.kind {
            NodeKind::Data(data) => Some(data),
            NodeKind::Op(_) => None,
        }
    }

    pub fn shape(&self) -> Option<&'g PartialShape> {
        self.data().map(|d| &d.shape)
    }

    pub fn value(&self) -> Option<&'g TensorValue> {
        self.data().and_then(|d| d.value.as_ref())
    }

    pub fn data_type(&self) -> Option<DType> {
        self.data().and_then(|d| d.data_type)
    }

    pub fn attrs(&self) -> &'g Attrs {
        &self.slot.attrs
    }

    /// Looks up an attribute that may be absent.
    pub fn attr(&self, key: &str) -> Option<&'g AttrValue> {
        self.slot.attrs.get(key)
    }

    /// Reads an attribute that must be present.
    ///
    /// # Errors
    /// [`GraphError::AttributeNotFound`] if the key is absent.
    pub fn get_attr(&self, key: &str) -> Result<&'g AttrValue, GraphError> {
        self.slot
            .attrs
            .get(key)
            .ok_or_else(|| GraphError::AttributeNotFound {
                node: self.slot.name.clone(),
                key: key.to_string(),
            })
    }

    /// Returns `true` if the attribute exists and is truthy.
    pub fn has_and_set(&self, key: &str) -> bool {
        self.attr(key).and_then(AttrValue::as_bool).unwrap_or(false)
    }

    /// Reads a required boolean attribute.
    pub fn get_bool(&self, key: &str) -> Result<bool, GraphError> {
        let v = self.get_attr(key)?;
        v.as_bool().ok_or_else(|| self.type_error(key, "bool", v))
    }

    /// Reads a required integer-list attribute.
    pub fn get_ints(&self, key: &str) -> Result<&'g [i64], GraphError> {
        let v = self.get_attr(key)?;
        v.as_ints().ok_or_else(|| self.type_error(key, "int list", v))
    }

    fn type_error(&self, key: &str, expected: &'static str, v: &AttrValue) -> GraphError {
        GraphError::AttributeType {
            node: self.slot.name.clone(),
            key: key.to_string(),
            expected,
            actual: v.type_name(),
        }
    }

    /// Whether the node awaits shape re-inference.
    pub fn is_stale(&self) -> bool {
        self.slot.stale
    }

    /// `(port on this node, predecessor)` pairs ordered by port.
    pub fn inputs(&self) -> Vec<(usize, NodeId)> {
        self.graph.ordered_inputs(self.slot)
    }

    /// `(port on this node, successor)` pairs ordered by port.
    pub fn outputs(&self) -> Vec<(usize, NodeId)> {
        self.graph.ordered_outputs(self.slot)
    }

    pub fn in_degree(&self) -> usize {
        self.slot.in_edges.len()
    }

    pub fn out_degree(&self) -> usize {
        self.slot.out_edges.len()
    }

    /// Distinct predecessors in port order.
    pub fn predecessors(&self) -> Vec<NodeId> {
        dedup_ids(self.inputs())
    }

    /// Distinct successors in port order.
    pub fn successors(&self) -> Vec<NodeId> {
        dedup_ids(self.outputs())
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.slot.name)
            .field("kind", &self.slot.kind)
            .finish()
    }
}

fn dedup_ids(pairs: Vec<(usize, NodeId)>) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::with_capacity(pairs.len());
    for (_, id) in pairs {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
