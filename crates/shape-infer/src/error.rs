// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape inference.

use graph_ir::GraphError;

/// Errors raised while inferring shapes.
#[derive(Debug, thiserror::Error)]
pub enum InferError {
    /// The inputs or attributes of a node are invalid for its operation.
    #[error("shape inference failed for '{node}' ({op}): {detail}")]
    ShapeInference {
        node: String,
        op: String,
        detail: String,
    },

    /// No inference function is registered for the node's operation.
    #[error("no shape inference registered for op '{op}' (node '{node}')")]
    UnknownOperation { node: String, op: String },

    /// An inference function was registered twice for the same operation.
    #[error("op '{0}' already has a shape inference function")]
    DuplicateOperation(String),

    /// A structural graph error surfaced during inference.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl InferError {
    /// Returns `true` for per-node failures a driver may record and skip.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            InferError::ShapeInference { .. } | InferError::UnknownOperation { .. }
        )
    }

    /// Short kind label used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            InferError::ShapeInference { .. } => "ShapeInference",
            InferError::UnknownOperation { .. } => "UnknownOperation",
            InferError::DuplicateOperation(_) => "DuplicateOperation",
            InferError::Graph(_) => "Graph",
        }
    }
}
