// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bipartite graph store of operation and data nodes.
//!
//! # Structure
//!
//! ```text
//!   [data] ──(0 → in_port)──▶ (op) ──(out_port → 0)──▶ [data]
//! ```
//!
//! Edges always join an operation node and a data node. An operation input
//! port has at most one producer, an operation output port feeds at most one
//! data node, and a data node has at most one producer. A data node may feed
//! any number of consumers.
//!
//! # Staleness
//!
//! Every public mutation marks the touched node and everything downstream of
//! it as stale. The inference pass recomputes stale nodes through the
//! `set_inferred_*` writers and [`Graph::mark_fresh`], which do not
//! invalidate anything themselves.

use crate::arena::Arena;
use crate::node::{DataNode, Edge, EdgeId, Node, NodeId, NodeKind, NodeSlot, OpNode};
use crate::{AttrValue, Attrs, GraphError};
use shape_core::{DType, PartialShape, TensorValue};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

// ── Graph ──────────────────────────────────────────────────────────

/// A mutable computation graph.
///
/// Nodes and edges live in append-only arenas, so ids stay unique for the
/// lifetime of the graph and iteration follows insertion order. Cloning the
/// graph is a deep copy; rewrites use it as an undo snapshot.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    nodes: Arena<NodeSlot>,
    edges: Arena<Edge>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Arena::default(),
            edges: Arena::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ── Construction ───────────────────────────────────────────────

    /// Adds an operation node of kind `op`. The node starts stale.
    pub fn add_operation_node(
        &mut self,
        name: impl Into<String>,
        op: impl Into<String>,
        attrs: Attrs,
    ) -> NodeId {
        let kind = NodeKind::Op(OpNode {
            op: op.into(),
            op_type: None,
        });
        self.insert_node(name.into(), kind, attrs)
    }

    /// Adds a data node. The node starts stale.
    pub fn add_data_node(
        &mut self,
        name: impl Into<String>,
        shape: PartialShape,
        value: Option<TensorValue>,
        data_type: Option<DType>,
    ) -> NodeId {
        let kind = NodeKind::Data(DataNode {
            shape,
            value,
            data_type,
        });
        self.insert_node(name.into(), kind, Attrs::new())
    }

    fn insert_node(&mut self, name: String, kind: NodeKind, attrs: Attrs) -> NodeId {
        let id = NodeId(self.nodes.insert(NodeSlot {
            name,
            kind,
            attrs,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
            stale: true,
        }));
        tracing::trace!("added node {id}");
        id
    }

    /// Sets the presentation type label of an operation node.
    pub fn set_op_type(&mut self, id: NodeId, op_type: impl Into<String>) -> Result<(), GraphError> {
        let slot = self.slot_mut(id)?;
        match &mut slot.kind {
            NodeKind::Op(op) => op.op_type = Some(op_type.into()),
            NodeKind::Data(_) => return Err(GraphError::NotAnOperation(slot.name.clone())),
        }
        self.mark_stale(id)
    }

    /// Connects `src:src_port` to `dst:dst_port`.
    ///
    /// # Errors
    /// - [`GraphError::StaleHandle`] if either node was removed.
    /// - [`GraphError::InvalidEdge`] unless exactly one side is a data node
    ///   and the data side uses port 0.
    /// - [`GraphError::PortAlreadyConnected`] if the op port or the data
    ///   node's single producer slot is taken.
    pub fn connect(
        &mut self,
        src: NodeId,
        src_port: usize,
        dst: NodeId,
        dst_port: usize,
    ) -> Result<EdgeId, GraphError> {
        let src_slot = self.slot(src)?;
        let dst_slot = self.slot(dst)?;
        let invalid = |detail: &str| GraphError::InvalidEdge {
            src: src_slot.name.clone(),
            dst: dst_slot.name.clone(),
            detail: detail.to_string(),
        };

        match (&src_slot.kind, &dst_slot.kind) {
            (NodeKind::Op(_), NodeKind::Data(_)) => {
                if dst_port != 0 {
                    return Err(invalid("data nodes have a single input port 0"));
                }
                if !dst_slot.in_edges.is_empty() {
                    return Err(GraphError::PortAlreadyConnected {
                        node: dst_slot.name.clone(),
                        port: 0,
                    });
                }
                if self.edge_at(src_slot, src_port, Direction::Out).is_some() {
                    return Err(GraphError::PortAlreadyConnected {
                        node: src_slot.name.clone(),
                        port: src_port,
                    });
                }
            }
            (NodeKind::Data(_), NodeKind::Op(_)) => {
                if src_port != 0 {
                    return Err(invalid("data nodes have a single output port 0"));
                }
                if self.edge_at(dst_slot, dst_port, Direction::In).is_some() {
                    return Err(GraphError::PortAlreadyConnected {
                        node: dst_slot.name.clone(),
                        port: dst_port,
                    });
                }
            }
            (NodeKind::Op(_), NodeKind::Op(_)) => {
                return Err(invalid("operation nodes must be joined through a data node"))
            }
            (NodeKind::Data(_), NodeKind::Data(_)) => {
                return Err(invalid("data nodes must be joined through an operation node"))
            }
        }

        let id = EdgeId(self.edges.insert(Edge {
            src,
            src_port,
            dst,
            dst_port,
        }));
        self.slot_mut(src)?.out_edges.push(id);
        self.slot_mut(dst)?.in_edges.push(id);
        self.mark_stale(dst)?;
        Ok(id)
    }

    /// Removes an edge and returns it.
    pub fn disconnect(&mut self, edge: EdgeId) -> Result<Edge, GraphError> {
        let removed = self
            .edges
            .remove(edge.0)
            .ok_or(GraphError::StaleEdge { id: edge })?;
        if let Some(slot) = self.nodes.get_mut(removed.src.0) {
            slot.out_edges.retain(|&e| e != edge);
        }
        if let Some(slot) = self.nodes.get_mut(removed.dst.0) {
            slot.in_edges.retain(|&e| e != edge);
        }
        self.mark_stale(removed.dst)?;
        Ok(removed)
    }

    /// Detaches whatever feeds input `port` of operation `op`.
    ///
    /// Returns the data node that was connected, if any.
    pub fn disconnect_input(&mut self, op: NodeId, port: usize) -> Result<Option<NodeId>, GraphError> {
        let slot = self.op_slot(op)?;
        match self.edge_at(slot, port, Direction::In) {
            Some(edge) => Ok(Some(self.disconnect(edge)?.src)),
            None => Ok(None),
        }
    }

    /// Detaches the data node fed by output `port` of operation `op`.
    ///
    /// Returns the data node that was connected, if any.
    pub fn disconnect_output(&mut self, op: NodeId, port: usize) -> Result<Option<NodeId>, GraphError> {
        let slot = self.op_slot(op)?;
        match self.edge_at(slot, port, Direction::Out) {
            Some(edge) => Ok(Some(self.disconnect(edge)?.dst)),
            None => Ok(None),
        }
    }

    /// Removes a node.
    ///
    /// With `cascade` every attached edge is detached first and the former
    /// consumers become stale. Without it a node that still has edges is
    /// rejected.
    pub fn remove_node(&mut self, id: NodeId, cascade: bool) -> Result<(), GraphError> {
        let slot = self.slot(id)?;
        let attached: Vec<EdgeId> = slot.in_edges.iter().chain(&slot.out_edges).copied().collect();
        if !attached.is_empty() && !cascade {
            return Err(GraphError::NodeInUse {
                node: slot.name.clone(),
                edges: attached.len(),
            });
        }
        for edge in attached {
            self.disconnect(edge)?;
        }
        if let Some(slot) = self.nodes.remove(id.0) {
            tracing::trace!("removed node '{}' ({id})", slot.name);
        }
        Ok(())
    }

    /// Renames a node.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), GraphError> {
        self.slot_mut(id)?.name = name.into();
        self.mark_stale(id)
    }

    // ── Attributes ─────────────────────────────────────────────────

    /// Reads a required attribute.
    pub fn get_attr(&self, id: NodeId, key: &str) -> Result<&AttrValue, GraphError> {
        let slot = self.slot(id)?;
        slot.attrs.get(key).ok_or_else(|| GraphError::AttributeNotFound {
            node: slot.name.clone(),
            key: key.to_string(),
        })
    }

    /// Reads an attribute, falling back to `default` when absent.
    pub fn get_attr_or(&self, id: NodeId, key: &str, default: AttrValue) -> Result<AttrValue, GraphError> {
        Ok(self.slot(id)?.attrs.get(key).cloned().unwrap_or(default))
    }

    /// Writes an attribute and returns the previous value.
    pub fn set_attr(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Result<Option<AttrValue>, GraphError> {
        let previous = self.slot_mut(id)?.attrs.insert(key.into(), value.into());
        self.mark_stale(id)?;
        Ok(previous)
    }

    /// Removes an attribute and returns it.
    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> Result<Option<AttrValue>, GraphError> {
        let previous = self.slot_mut(id)?.attrs.remove(key);
        if previous.is_some() {
            self.mark_stale(id)?;
        }
        Ok(previous)
    }

    // ── Data payloads ──────────────────────────────────────────────

    /// Overwrites the shape of a data node.
    pub fn set_shape(&mut self, id: NodeId, shape: PartialShape) -> Result<(), GraphError> {
        self.data_mut(id)?.shape = shape;
        self.mark_stale(id)
    }

    /// Overwrites the compile-time value of a data node.
    pub fn set_value(&mut self, id: NodeId, value: Option<TensorValue>) -> Result<(), GraphError> {
        self.data_mut(id)?.value = value;
        self.mark_stale(id)
    }

    /// Overwrites the declared element type of a data node.
    pub fn set_data_type(&mut self, id: NodeId, data_type: Option<DType>) -> Result<(), GraphError> {
        self.data_mut(id)?.data_type = data_type;
        self.mark_stale(id)
    }

    /// Shape write used by inference; leaves staleness untouched.
    pub fn set_inferred_shape(&mut self, id: NodeId, shape: PartialShape) -> Result<(), GraphError> {
        self.data_mut(id)?.shape = shape;
        Ok(())
    }

    /// Value write used by inference; leaves staleness untouched.
    pub fn set_inferred_value(&mut self, id: NodeId, value: Option<TensorValue>) -> Result<(), GraphError> {
        self.data_mut(id)?.value = value;
        Ok(())
    }

    /// Element type write used by inference; leaves staleness untouched.
    pub fn set_inferred_data_type(&mut self, id: NodeId, data_type: Option<DType>) -> Result<(), GraphError> {
        self.data_mut(id)?.data_type = data_type;
        Ok(())
    }

    // ── Staleness ──────────────────────────────────────────────────

    /// Marks `id` and every node reachable from it as stale.
    pub fn mark_stale(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.slot(id)?;
        let mut stack = vec![id];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(slot) = self.nodes.get_mut(current.0) else {
                continue;
            };
            slot.stale = true;
            for edge in &slot.out_edges {
                if let Some(e) = self.edges.get(edge.0) {
                    stack.push(e.dst);
                }
            }
        }
        Ok(())
    }

    /// Clears the stale flag of a single node.
    pub fn mark_fresh(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.slot_mut(id)?.stale = false;
        Ok(())
    }

    pub fn is_stale(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(self.slot(id)?.stale)
    }

    /// Stale nodes in insertion order.
    pub fn stale_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, slot)| slot.stale)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// Returns `true` if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Borrows a live node.
    ///
    /// # Errors
    /// [`GraphError::StaleHandle`] if the node was removed.
    pub fn node(&self, id: NodeId) -> Result<Node<'_>, GraphError> {
        let slot = self.slot(id)?;
        Ok(Node {
            graph: self,
            id,
            slot,
        })
    }

    /// Iterates over live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        self.nodes.iter().map(move |(i, slot)| Node {
            graph: self,
            id: NodeId(i),
            slot,
        })
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|(i, _)| NodeId(i)).collect()
    }

    pub fn op_nodes(&self) -> Vec<NodeId> {
        self.nodes().filter(|n| n.is_op()).map(|n| n.id()).collect()
    }

    pub fn data_nodes(&self) -> Vec<NodeId> {
        self.nodes().filter(|n| n.is_data()).map(|n| n.id()).collect()
    }

    /// Operation nodes of kind `op`, in insertion order.
    pub fn nodes_by_op(&self, op: &str) -> Vec<NodeId> {
        self.nodes().filter(|n| n.op() == Some(op)).map(|n| n.id()).collect()
    }

    /// First node with the given name, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, s)| s.name == name).map(|(i, _)| NodeId(i))
    }

    /// Like [`Graph::find_by_name`], but a missing node is an error.
    pub fn node_by_name(&self, name: &str) -> Result<NodeId, GraphError> {
        self.find_by_name(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Result<Edge, GraphError> {
        self.edges.get(id.0).copied().ok_or(GraphError::StaleEdge { id })
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, Edge)> + '_ {
        self.edges.iter().map(|(i, e)| (EdgeId(i), *e))
    }

    // ── Structural queries ─────────────────────────────────────────

    /// `(port on node, predecessor)` pairs ordered by port.
    pub fn inputs_of(&self, id: NodeId) -> Result<Vec<(usize, NodeId)>, GraphError> {
        Ok(self.ordered_inputs(self.slot(id)?))
    }

    /// `(port on node, successor)` pairs ordered by port.
    pub fn outputs_of(&self, id: NodeId) -> Result<Vec<(usize, NodeId)>, GraphError> {
        Ok(self.ordered_outputs(self.slot(id)?))
    }

    /// Incoming edges in insertion order.
    pub fn in_edges(&self, id: NodeId) -> Result<Vec<(EdgeId, Edge)>, GraphError> {
        Ok(self.collect_edges(&self.slot(id)?.in_edges))
    }

    /// Outgoing edges in insertion order.
    pub fn out_edges(&self, id: NodeId) -> Result<Vec<(EdgeId, Edge)>, GraphError> {
        Ok(self.collect_edges(&self.slot(id)?.out_edges))
    }

    pub fn predecessors(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self.node(id)?.predecessors())
    }

    pub fn successors(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self.node(id)?.successors())
    }

    pub fn in_degree(&self, id: NodeId) -> Result<usize, GraphError> {
        Ok(self.slot(id)?.in_edges.len())
    }

    pub fn out_degree(&self, id: NodeId) -> Result<usize, GraphError> {
        Ok(self.slot(id)?.out_edges.len())
    }

    /// The operation producing a data node and its output port.
    pub fn producer_of(&self, data: NodeId) -> Result<Option<(NodeId, usize)>, GraphError> {
        let slot = self.data_slot(data)?;
        Ok(slot
            .in_edges
            .first()
            .and_then(|e| self.edges.get(e.0))
            .map(|e| (e.src, e.src_port)))
    }

    /// Consumers of a data node with the input port each one uses, in edge
    /// insertion order.
    pub fn consumers_of(&self, data: NodeId) -> Result<Vec<(NodeId, usize)>, GraphError> {
        let slot = self.data_slot(data)?;
        Ok(self
            .collect_edges(&slot.out_edges)
            .into_iter()
            .map(|(_, e)| (e.dst, e.dst_port))
            .collect())
    }

    /// Data node connected to input `port` of operation `op`.
    pub fn in_data(&self, op: NodeId, port: usize) -> Result<Option<NodeId>, GraphError> {
        let slot = self.op_slot(op)?;
        Ok(self
            .edge_at(slot, port, Direction::In)
            .and_then(|e| self.edges.get(e.0))
            .map(|e| e.src))
    }

    /// Data node connected to output `port` of operation `op`.
    pub fn out_data(&self, op: NodeId, port: usize) -> Result<Option<NodeId>, GraphError> {
        let slot = self.op_slot(op)?;
        Ok(self
            .edge_at(slot, port, Direction::Out)
            .and_then(|e| self.edges.get(e.0))
            .map(|e| e.dst))
    }

    // ── Whole-graph queries ────────────────────────────────────────

    /// Topological order of all live nodes.
    ///
    /// Ties are broken by insertion order, so the result is deterministic.
    ///
    /// # Errors
    /// [`GraphError::Cycle`] if the graph is not acyclic.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut indegree: HashMap<NodeId, usize> = HashMap::with_capacity(self.node_count());
        let mut ready = BTreeSet::new();
        for (i, slot) in self.nodes.iter() {
            let id = NodeId(i);
            indegree.insert(id, slot.in_edges.len());
            if slot.in_edges.is_empty() {
                ready.insert(id);
            }
        }

        let mut order = Vec::with_capacity(self.node_count());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for (_, edge) in self.out_edges(id)? {
                if let Some(d) = indegree.get_mut(&edge.dst) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(edge.dst);
                    }
                }
            }
        }

        if order.len() != self.node_count() {
            return Err(GraphError::Cycle(self.name.clone()));
        }
        Ok(order)
    }

    /// Checks structural well-formedness.
    ///
    /// # Checks
    /// - The graph is acyclic.
    /// - Input ports of every operation are numbered `0..n` without gaps.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.topological_order()?;
        for node in self.nodes().filter(|n| n.is_op()) {
            let ports: Vec<usize> = node.inputs().into_iter().map(|(p, _)| p).collect();
            if ports.iter().enumerate().any(|(i, &p)| i != p) {
                return Err(GraphError::NonContiguousPorts {
                    node: node.name().to_string(),
                    ports,
                });
            }
        }
        Ok(())
    }

    /// Returns a one-line summary of the graph.
    pub fn summary(&self) -> String {
        let ops = self.nodes().filter(|n| n.is_op()).count();
        format!(
            "Graph '{}': {} op nodes, {} data nodes, {} edges, {} stale",
            self.name,
            ops,
            self.node_count() - ops,
            self.edge_count(),
            self.stale_nodes().len(),
        )
    }

    // ── Internals ──────────────────────────────────────────────────

    fn slot(&self, id: NodeId) -> Result<&NodeSlot, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::StaleHandle { id })
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut NodeSlot, GraphError> {
        self.nodes.get_mut(id.0).ok_or(GraphError::StaleHandle { id })
    }

    fn op_slot(&self, id: NodeId) -> Result<&NodeSlot, GraphError> {
        let slot = self.slot(id)?;
        match slot.kind {
            NodeKind::Op(_) => Ok(slot),
            NodeKind::Data(_) => Err(GraphError::NotAnOperation(slot.name.clone())),
        }
    }

    fn data_slot(&self, id: NodeId) -> Result<&NodeSlot, GraphError> {
        let slot = self.slot(id)?;
        match slot.kind {
            NodeKind::Data(_) => Ok(slot),
            NodeKind::Op(_) => Err(GraphError::NotData(slot.name.clone())),
        }
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut DataNode, GraphError> {
        let slot = self.slot_mut(id)?;
        match &mut slot.kind {
            NodeKind::Data(data) => Ok(data),
            NodeKind::Op(_) => Err(GraphError::NotData(slot.name.clone())),
        }
    }

    fn edge_at(&self, slot: &NodeSlot, port: usize, dir: Direction) -> Option<EdgeId> {
        let edges = match dir {
            Direction::In => &slot.in_edges,
            Direction::Out => &slot.out_edges,
        };
        edges.iter().copied().find(|id| {
            self.edges.get(id.0).is_some_and(|e| match dir {
                Direction::In => e.dst_port == port,
                Direction::Out => e.src_port == port,
            })
        })
    }

    fn collect_edges(&self, ids: &[EdgeId]) -> Vec<(EdgeId, Edge)> {
        ids.iter()
            .filter_map(|&id| self.edges.get(id.0).map(|e| (id, *e)))
            .collect()
    }

    pub(crate) fn ordered_inputs(&self, slot: &NodeSlot) -> Vec<(usize, NodeId)> {
        let mut out: Vec<(usize, NodeId)> = self
            .collect_edges(&slot.in_edges)
            .into_iter()
            .map(|(_, e)| (e.dst_port, e.src))
            .collect();
        // Stable sort keeps insertion order among equal ports.
        out.sort_by_key(|&(port, _)| port);
        out
    }

    pub(crate) fn ordered_outputs(&self, slot: &NodeSlot) -> Vec<(usize, NodeId)> {
        let mut out: Vec<(usize, NodeId)> = self
            .collect_edges(&slot.out_edges)
            .into_iter()
            .map(|(_, e)| (e.src_port, e.dst))
            .collect();
        out.sort_by_key(|&(port, _)| port);
        out
    }
}

#[derive(Clone, Copy)]
enum Direction {
    In,
    Out,
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for node in self.nodes() {
            let stale = if node.is_stale() { " (stale)" } else { "" };
            match node.kind() {
                NodeKind::Op(op) => {
                    let inputs: Vec<String> = node
                        .inputs()
                        .iter()
                        .map(|&(_, src)| src.to_string())
                        .collect();
                    writeln!(
                        f,
                        "  {} {} = {}({}){stale}",
                        node.id(),
                        node.name(),
                        op.op,
                        inputs.join(", ")
                    )?;
                }
                NodeKind::Data(data) => {
                    write!(f, "  {} {}: {}", node.id(), node.name(), data.shape)?;
                    if let Some(dt) = data.data_type {
                        write!(f, " {dt}")?;
                    }
                    if let Some(v) = &data.value {
                        write!(f, " = {v}")?;
                    }
                    writeln!(f, "{stale}")?;
                }
            }
        }
        Ok(())
    }
}
