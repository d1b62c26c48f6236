// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph descriptions.
//!
//! A description is the serialized, name-addressed form of a [`Graph`]. It is
//! what loaders produce and what the CLI reads and writes.
//!
//! # Format
//! ```json
//! {
//!   "name": "where",
//!   "nodes": [
//!     { "kind": "op", "name": "placeholder", "op": "Parameter", "attrs": { "shape": [-1, 3] } },
//!     { "kind": "data", "name": "placeholder_data", "shape": [-1, 3], "data_type": "f32" },
//!     { "kind": "op", "name": "tf_where", "op": "Where" }
//!   ],
//!   "edges": [
//!     { "src": "placeholder", "dst": "placeholder_data" },
//!     { "src": "placeholder_data", "dst": "tf_where", "in": 0 }
//!   ]
//! }
//! ```
//!
//! Ports default to 0. A data node's `shape` defaults to an unknown rank.

use crate::{Attrs, Graph, GraphError, NodeId, NodeKind};
use shape_core::{DType, PartialShape, TensorValue};
use std::collections::HashMap;
use std::path::Path;

/// Serialized form of a whole graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphDescription {
    pub name: String,
    pub nodes: Vec<NodeDescription>,
    #[serde(default)]
    pub edges: Vec<EdgeDescription>,
}

/// One node entry, tagged by `"kind"`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeDescription {
    Op {
        name: String,
        op: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        op_type: Option<String>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
    },
    Data {
        name: String,
        #[serde(default)]
        shape: PartialShape,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<TensorValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_type: Option<DType>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
    },
}

impl NodeDescription {
    pub fn name(&self) -> &str {
        match self {
            NodeDescription::Op { name, .. } | NodeDescription::Data { name, .. } => name,
        }
    }
}

/// One edge entry, addressed by node names.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EdgeDescription {
    pub src: String,
    pub dst: String,
    /// Output port on `src`.
    #[serde(rename = "out", default)]
    pub out_port: usize,
    /// Input port on `dst`.
    #[serde(rename = "in", default)]
    pub in_port: usize,
}

impl GraphDescription {
    /// Loads a description from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a description from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let description: Self = serde_json::from_str(json)?;
        Ok(description)
    }

    /// Serializes the description as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds a [`Graph`].
    ///
    /// # Errors
    /// - [`GraphError::Description`] on duplicate node names or edges that
    ///   name unknown nodes.
    /// - Any edge error raised by [`Graph::connect`].
    pub fn build(&self) -> Result<Graph, GraphError> {
        let mut graph = Graph::new(self.name.clone());
        let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let id = match node {
                NodeDescription::Op {
                    name,
                    op,
                    op_type,
                    attrs,
                } => {
                    let id = graph.add_operation_node(name.clone(), op.clone(), attrs.clone());
                    if let Some(t) = op_type {
                        graph.set_op_type(id, t.clone())?;
                    }
                    id
                }
                NodeDescription::Data {
                    name,
                    shape,
                    value,
                    data_type,
                    attrs,
                } => {
                    let id = graph.add_data_node(name.clone(), shape.clone(), value.clone(), *data_type);
                    for (k, v) in attrs {
                        graph.set_attr(id, k.clone(), v.clone())?;
                    }
                    id
                }
            };
            if ids.insert(node.name(), id).is_some() {
                return Err(GraphError::Description(format!(
                    "duplicate node name '{}'",
                    node.name()
                )));
            }
        }

        let lookup = |name: &str| {
            ids.get(name).copied().ok_or_else(|| {
                GraphError::Description(format!("edge references unknown node '{name}'"))
            })
        };
        for edge in &self.edges {
            let src = lookup(&edge.src)?;
            let dst = lookup(&edge.dst)?;
            graph.connect(src, edge.out_port, dst, edge.in_port)?;
        }

        tracing::debug!("built {}", graph.summary());
        Ok(graph)
    }
}

impl Graph {
    /// Converts the graph to its serialized form.
    ///
    /// Nodes and edges are listed in insertion order.
    pub fn to_description(&self) -> GraphDescription {
        let nodes = self
            .nodes()
            .map(|node| match node.kind() {
                NodeKind::Op(op) => NodeDescription::Op {
                    name: node.name().to_string(),
                    op: op.op.clone(),
                    op_type: op.op_type.clone(),
                    attrs: node.attrs().clone(),
                },
                NodeKind::Data(data) => NodeDescription::Data {
                    name: node.name().to_string(),
                    shape: data.shape.clone(),
                    value: data.value.clone(),
                    data_type: data.data_type,
                    attrs: node.attrs().clone(),
                },
            })
            .collect();

        let edges = self
            .edges()
            .filter_map(|(_, e)| {
                let src = self.node(e.src).ok()?;
                let dst = self.node(e.dst).ok()?;
                Some(EdgeDescription {
                    src: src.name().to_string(),
                    dst: dst.name().to_string(),
                    out_port: e.src_port,
                    in_port: e.dst_port,
                })
            })
            .collect();

        GraphDescription {
            name: self.name().to_string(),
            nodes,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttrValue;
    use shape_core::Dim;

    fn sample_json() -> &'static str {
        r#"{
            "name": "mm",
            "nodes": [
                { "kind": "op", "name": "a", "op": "Parameter", "attrs": { "shape": [-1, 8] } },
                { "kind": "data", "name": "a_data", "shape": [-1, 8], "data_type": "f32" },
                { "kind": "op", "name": "w", "op": "Const" },
                { "kind": "data", "name": "w_data", "shape": [8, 4], "data_type": "f32" },
                { "kind": "op", "name": "mm", "op": "MatMul", "type": "MatMul",
                  "attrs": { "transpose_a": false } },
                { "kind": "data", "name": "mm_data" }
            ],
            "edges": [
                { "src": "a", "dst": "a_data" },
                { "src": "w", "dst": "w_data" },
                { "src": "a_data", "dst": "mm", "in": 0 },
                { "src": "w_data", "dst": "mm", "in": 1 },
                { "src": "mm", "dst": "mm_data" }
            ]
        }"#
    }

    #[test]
    fn test_parse_and_build() {
        let desc = GraphDescription::from_json(sample_json()).unwrap();
        assert_eq!(desc.nodes.len(), 6);
        let graph = desc.build().unwrap();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 5);

        let mm = graph.node_by_name("mm").unwrap();
        let node = graph.node(mm).unwrap();
        assert_eq!(node.op_type(), Some("MatMul"));
        assert_eq!(node.attr("transpose_a"), Some(&AttrValue::Bool(false)));

        let a_data = graph.node_by_name("a_data").unwrap();
        assert_eq!(graph.in_data(mm, 0).unwrap(), Some(a_data));
        assert_eq!(
            graph.node(a_data).unwrap().shape(),
            Some(&PartialShape::from_dims([Dim::Dynamic, Dim::Static(8)]))
        );
        let mm_data = graph.node_by_name("mm_data").unwrap();
        assert_eq!(graph.node(mm_data).unwrap().shape(), Some(&PartialShape::Unknown));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "name": "dup", "nodes": [
            { "kind": "op", "name": "x", "op": "Parameter" },
            { "kind": "data", "name": "x" }
        ] }"#;
        let err = GraphDescription::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, GraphError::Description(_)));
    }

    #[test]
    fn test_unknown_edge_endpoint() {
        let json = r#"{ "name": "e", "nodes": [ { "kind": "op", "name": "x", "op": "Parameter" } ],
            "edges": [ { "src": "x", "dst": "nowhere" } ] }"#;
        let err = GraphDescription::from_json(json).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_description_survives_graph() {
        let desc = GraphDescription::from_json(sample_json()).unwrap();
        let graph = desc.build().unwrap();
        let again = graph.to_description();
        assert_eq!(again.nodes, desc.nodes);
        assert_eq!(again.edges, desc.edges);
        let json = again.to_json().unwrap();
        assert_eq!(GraphDescription::from_json(&json).unwrap(), again);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GraphDescription::from_json("{ nope"),
            Err(GraphError::Json(_))
        ));
    }

    #[test]
    fn test_value_shorter_than_shape_rejected() {
        let data_value = r#"{ "name": "v", "nodes": [
            { "kind": "data", "name": "c", "shape": [2, 2],
              "value": { "shape": [2, 2], "data": [1, 2] } }
        ] }"#;
        assert!(matches!(
            GraphDescription::from_json(data_value),
            Err(GraphError::Json(_))
        ));

        let const_attr = r#"{ "name": "v", "nodes": [
            { "kind": "op", "name": "c", "op": "Const",
              "attrs": { "value": { "shape": [2, 2], "data": [1, 2] } } }
        ] }"#;
        assert!(GraphDescription::from_json(const_attr).is_err());
    }
}
