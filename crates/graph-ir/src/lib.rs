// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-ir
//!
//! A mutable, bipartite computation graph for model conversion.
//!
//! - [`Graph`]: the node/edge store with staleness tracking.
//! - [`NodeId`] / [`Node`]: an opaque handle and a borrowed read view.
//! - [`AttrValue`] / [`Attrs`]: open attribute maps on every node.
//! - [`GraphDescription`]: the JSON form loaders produce.
//! - [`GraphBuilder`]: fluent construction for tests and small loaders.
//! - [`compare_graphs`]: structural equivalence between two graphs.
//!
//! # Example
//! ```
//! use graph_ir::{Attrs, Graph};
//! use shape_core::PartialShape;
//!
//! let mut graph = Graph::new("tiny");
//! let input = graph.add_operation_node("input", "Parameter", Attrs::new());
//! let data = graph.add_data_node("input_data", PartialShape::static_shape(&[4]), None, None);
//! graph.connect(input, 0, data, 0).unwrap();
//! assert_eq!(graph.producer_of(data).unwrap(), Some((input, 0)));
//! println!("{graph}");
//! ```

mod arena;
mod attr;
mod builder;
pub mod compare;
mod description;
mod error;
mod graph;
mod node;

pub use attr::{AttrValue, Attrs};
pub use builder::GraphBuilder;
pub use compare::{compare_graphs, compare_graphs_with, CompareOptions, Comparison};
pub use description::{EdgeDescription, GraphDescription, NodeDescription};
pub use error::GraphError;
pub use graph::Graph;
pub use node::{DataNode, Edge, EdgeId, Node, NodeId, NodeKind, OpNode};
