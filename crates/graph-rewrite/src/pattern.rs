// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Declarative subgraph patterns.
//!
//! A [`Pattern`] is a list of labelled [`NodeMatcher`]s plus the edges that
//! must connect them. The first declared node is the anchor: matching scans
//! anchor candidates in node insertion order.

use crate::RewriteError;
use graph_ir::{AttrValue, Node, NodeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Custom node test used by [`NodeMatcher::with_predicate`].
pub type NodePredicate = Arc<dyn Fn(&Node<'_>) -> bool + Send + Sync>;

/// Which side of the bipartite graph a pattern node must be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Op,
    Data,
}

/// Criteria a single graph node must satisfy.
///
/// All criteria are conjunctive; an empty matcher accepts any node.
#[derive(Clone, Default)]
pub struct NodeMatcher {
    class: Option<NodeClass>,
    op: Option<String>,
    attrs: Vec<(String, AttrValue)>,
    present: Vec<String>,
    predicate: Option<NodePredicate>,
}

impl NodeMatcher {
    /// Accepts any node.
    pub fn any() -> Self {
        Self::default()
    }

    /// Accepts operation nodes of kind `op`.
    pub fn op(op: impl Into<String>) -> Self {
        Self {
            class: Some(NodeClass::Op),
            op: Some(op.into()),
            ..Self::default()
        }
    }

    /// Accepts any operation node.
    pub fn any_op() -> Self {
        Self {
            class: Some(NodeClass::Op),
            ..Self::default()
        }
    }

    /// Accepts any data node.
    pub fn data() -> Self {
        Self {
            class: Some(NodeClass::Data),
            ..Self::default()
        }
    }

    /// Requires attribute `key` to equal `value`.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Requires attribute `key` to be present, whatever its value.
    pub fn with_attr_present(mut self, key: impl Into<String>) -> Self {
        self.present.push(key.into());
        self
    }

    /// Adds a custom test. A matcher holds at most one predicate; a second
    /// call replaces the first.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Node<'_>) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Tests a node against every criterion.
    pub fn matches(&self, node: &Node<'_>) -> bool {
        let class_ok = match self.class {
            Some(NodeClass::Op) => node.is_op(),
            Some(NodeClass::Data) => node.is_data(),
            None => true,
        };
        class_ok
            && self.op.as_deref().map_or(true, |op| node.op() == Some(op))
            && self.attrs.iter().all(|(k, v)| node.attr(k) == Some(v))
            && self.present.iter().all(|k| node.attr(k).is_some())
            && self.predicate.as_ref().map_or(true, |p| p(node))
    }
}

impl fmt::Debug for NodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeMatcher")
            .field("class", &self.class)
            .field("op", &self.op)
            .field("attrs", &self.attrs)
            .field("present", &self.present)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// A required edge between two labelled pattern nodes.
///
/// A port left as `None` accepts any port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEdge {
    pub src: String,
    pub dst: String,
    pub src_port: Option<usize>,
    pub dst_port: Option<usize>,
}

/// A subgraph shape to search for.
///
/// # Example
/// ```
/// use graph_rewrite::{NodeMatcher, Pattern};
///
/// let pattern = Pattern::new()
///     .node("where", NodeMatcher::op("Where"))
///     .node("input", NodeMatcher::data())
///     .edge_ports("input", "where", None, Some(0));
/// assert_eq!(pattern.len(), 2);
/// assert!(pattern.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    pub(crate) nodes: Vec<(String, NodeMatcher)>,
    pub(crate) edges: Vec<PatternEdge>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a labelled node. The first declaration is the anchor.
    pub fn node(mut self, label: impl Into<String>, matcher: NodeMatcher) -> Self {
        self.nodes.push((label.into(), matcher));
        self
    }

    /// Requires an edge `src -> dst` on any ports.
    pub fn edge(self, src: &str, dst: &str) -> Self {
        self.edge_ports(src, dst, None, None)
    }

    /// Requires an edge `src -> dst`, optionally pinning either port.
    pub fn edge_ports(mut self, src: &str, dst: &str, src_port: Option<usize>, dst_port: Option<usize>) -> Self {
        self.edges.push(PatternEdge {
            src: src.to_string(),
            dst: dst.to_string(),
            src_port,
            dst_port,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(|(label, _)| label.as_str())
    }

    pub fn edges(&self) -> &[PatternEdge] {
        &self.edges
    }

    /// Position of `label` in declaration order.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.nodes.iter().position(|(l, _)| l == label)
    }

    /// Checks that labels are unique and every edge names declared labels.
    pub fn validate(&self) -> Result<(), RewriteError> {
        let mut seen = HashSet::new();
        for (label, _) in &self.nodes {
            if !seen.insert(label.as_str()) {
                return Err(RewriteError::InvalidPattern(format!("label '{label}' declared twice")));
            }
        }
        for edge in &self.edges {
            for label in [&edge.src, &edge.dst] {
                if !seen.contains(label.as_str()) {
                    return Err(RewriteError::InvalidPattern(format!(
                        "edge {} -> {} names undeclared label '{label}'",
                        edge.src, edge.dst
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One occurrence of a pattern: a label-to-node binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    bindings: Vec<(String, NodeId)>,
}

impl Match {
    pub(crate) fn new(bindings: Vec<(String, NodeId)>) -> Self {
        Self { bindings }
    }

    /// The node bound to `label`, if any.
    pub fn get(&self, label: &str) -> Option<NodeId> {
        self.bindings.iter().find(|(l, _)| l == label).map(|&(_, id)| id)
    }

    /// The node bound to `label`.
    ///
    /// # Errors
    /// [`RewriteError::MissingLabel`] if the pattern declared no such label.
    pub fn node(&self, label: &str) -> Result<NodeId, RewriteError> {
        self.get(label)
            .ok_or_else(|| RewriteError::MissingLabel(label.to_string()))
    }

    /// The anchor binding.
    pub fn anchor(&self) -> Option<NodeId> {
        self.bindings.first().map(|&(_, id)| id)
    }

    /// Bound nodes in pattern declaration order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bindings.iter().map(|&(_, id)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.bindings.iter().map(|(l, id)| (l.as_str(), *id))
    }
}
