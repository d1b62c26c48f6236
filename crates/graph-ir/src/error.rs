// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph construction and mutation.

use crate::{EdgeId, NodeId};

/// Errors raised by the graph store.
///
/// [`GraphError::StaleHandle`], [`GraphError::NodeInUse`] and the edge
/// errors are contract violations by the caller; a conversion driver treats
/// them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The node id refers to a node that has been removed.
    #[error("stale handle: node {id} no longer exists")]
    StaleHandle { id: NodeId },

    /// The edge id refers to an edge that has been removed.
    #[error("stale edge: edge {id} no longer exists")]
    StaleEdge { id: EdgeId },

    /// A node still has edges attached and cascading removal was not requested.
    #[error("node '{node}' is still in use by {edges} edge(s)")]
    NodeInUse { node: String, edges: usize },

    /// An attribute was read that the node does not carry.
    #[error("node '{node}' has no attribute '{key}'")]
    AttributeNotFound { node: String, key: String },

    /// An attribute exists but has the wrong type.
    #[error("attribute '{key}' of node '{node}' is {actual}, expected {expected}")]
    AttributeType {
        node: String,
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The requested edge does not connect an operation and a data node
    /// with valid ports.
    #[error("invalid edge {src} -> {dst}: {detail}")]
    InvalidEdge {
        src: String,
        dst: String,
        detail: String,
    },

    /// The port already has a producer (op input) or a data node (op output).
    #[error("port {port} of node '{node}' is already connected")]
    PortAlreadyConnected { node: String, port: usize },

    /// No node with the given name exists.
    #[error("node '{0}' not found")]
    NodeNotFound(String),

    /// The operation requires an operation node.
    #[error("node '{0}' is not an operation node")]
    NotAnOperation(String),

    /// The operation requires a data node.
    #[error("node '{0}' is not a data node")]
    NotData(String),

    /// The graph contains a directed cycle.
    #[error("graph '{0}' contains a cycle")]
    Cycle(String),

    /// Input ports of an operation are not numbered `0..n`.
    #[error("input ports of '{node}' are not contiguous: {ports:?}")]
    NonContiguousPorts { node: String, ports: Vec<usize> },

    /// A graph description is inconsistent.
    #[error("invalid graph description: {0}")]
    Description(String),

    /// A graph description file could not be read.
    #[error("failed to read graph description: {0}")]
    Io(#[from] std::io::Error),

    /// A graph description is not valid JSON.
    #[error("failed to parse graph description: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Returns `true` for errors that indicate a broken caller contract
    /// rather than bad input data.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            GraphError::Description(_) | GraphError::Io(_) | GraphError::Json(_)
        )
    }
}
