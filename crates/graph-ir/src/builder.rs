// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fluent graph construction, mostly for tests and small programmatic
//! loaders.
//!
//! ```
//! use graph_ir::GraphBuilder;
//!
//! let graph = GraphBuilder::new("relu")
//!     .op("input", "Parameter").attr("shape", vec![1i64, 3])
//!     .data("input_data").shape(&[1, 3])
//!     .op("relu", "Relu")
//!     .data("relu_data")
//!     .op("output", "Result")
//!     .chain(&["input", "input_data", "relu", "relu_data", "output"])
//!     .build()
//!     .unwrap();
//! assert_eq!(graph.edge_count(), 4);
//! ```
//!
//! Mistakes such as calling [`GraphBuilder::shape`] after an operation node
//! are collected and reported by [`GraphBuilder::build`].

use crate::{
    AttrValue, Attrs, EdgeDescription, Graph, GraphDescription, GraphError, NodeDescription,
};
use shape_core::{DType, Dim, PartialShape, TensorValue};

/// Accumulates nodes and edges, then builds a [`Graph`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    description: GraphDescription,
    error: Option<String>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            description: GraphDescription {
                name: name.into(),
                nodes: Vec::new(),
                edges: Vec::new(),
            },
            error: None,
        }
    }

    /// Adds an operation node; following modifiers apply to it.
    pub fn op(mut self, name: impl Into<String>, op: impl Into<String>) -> Self {
        self.description.nodes.push(NodeDescription::Op {
            name: name.into(),
            op: op.into(),
            op_type: None,
            attrs: Attrs::new(),
        });
        self
    }

    /// Adds a data node with unknown shape; following modifiers apply to it.
    pub fn data(mut self, name: impl Into<String>) -> Self {
        self.description.nodes.push(NodeDescription::Data {
            name: name.into(),
            shape: PartialShape::Unknown,
            value: None,
            data_type: None,
            attrs: Attrs::new(),
        });
        self
    }

    /// Sets an attribute on the last node.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        match self.description.nodes.last_mut() {
            Some(NodeDescription::Op { attrs, .. } | NodeDescription::Data { attrs, .. }) => {
                attrs.insert(key.into(), value.into());
            }
            None => self.fail("attr() called before any node"),
        }
        self
    }

    /// Sets the presentation type label of the last (operation) node.
    pub fn op_type(mut self, label: impl Into<String>) -> Self {
        match self.description.nodes.last_mut() {
            Some(NodeDescription::Op { op_type, .. }) => *op_type = Some(label.into()),
            _ => self.fail("op_type() must follow an operation node"),
        }
        self
    }

    /// Sets the shape of the last (data) node; `-1` marks a dynamic dimension.
    pub fn shape(mut self, dims: &[i64]) -> Self {
        match dims.iter().map(|&d| Dim::try_from(d)).collect::<Result<Vec<_>, _>>() {
            Ok(dims) => self.partial_shape(PartialShape::Ranked(dims)),
            Err(e) => {
                self.fail(&e.to_string());
                self
            }
        }
    }

    /// Sets the shape of the last (data) node.
    pub fn partial_shape(mut self, new_shape: PartialShape) -> Self {
        match self.description.nodes.last_mut() {
            Some(NodeDescription::Data { shape, .. }) => *shape = new_shape,
            _ => self.fail("shape() must follow a data node"),
        }
        self
    }

    /// Sets the compile-time value of the last (data) node.
    pub fn value(mut self, new_value: TensorValue) -> Self {
        match self.description.nodes.last_mut() {
            Some(NodeDescription::Data { value, .. }) => *value = Some(new_value),
            _ => self.fail("value() must follow a data node"),
        }
        self
    }

    /// Sets the element type of the last (data) node.
    pub fn dtype(mut self, dtype: DType) -> Self {
        match self.description.nodes.last_mut() {
            Some(NodeDescription::Data { data_type, .. }) => *data_type = Some(dtype),
            _ => self.fail("dtype() must follow a data node"),
        }
        self
    }

    /// Adds an edge between port 0 of `src` and port 0 of `dst`.
    pub fn edge(self, src: &str, dst: &str) -> Self {
        self.edge_ports(src, dst, 0, 0)
    }

    /// Adds an edge with explicit ports.
    pub fn edge_ports(mut self, src: &str, dst: &str, out_port: usize, in_port: usize) -> Self {
        self.description.edges.push(EdgeDescription {
            src: src.to_string(),
            dst: dst.to_string(),
            out_port,
            in_port,
        });
        self
    }

    /// Adds port-0 edges along a path of node names.
    pub fn chain(mut self, names: &[&str]) -> Self {
        for pair in names.windows(2) {
            self = self.edge(pair[0], pair[1]);
        }
        self
    }

    /// Returns the accumulated description.
    pub fn into_description(self) -> Result<GraphDescription, GraphError> {
        match self.error {
            Some(e) => Err(GraphError::Description(e)),
            None => Ok(self.description),
        }
    }

    /// Builds the graph.
    pub fn build(self) -> Result<Graph, GraphError> {
        self.into_description()?.build()
    }

    fn fail(&mut self, message: &str) {
        if self.error.is_none() {
            self.error = Some(message.to_string());
        }
    }
}
