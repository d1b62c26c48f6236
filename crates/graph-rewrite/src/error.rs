// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for pattern matching and rewriting.

use graph_ir::GraphError;

/// Errors raised by patterns and rewrite rules.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// A rule's replacement failed; the graph was restored.
    #[error("rule '{rule}' failed on '{node}': {detail}")]
    RewriteFailed {
        rule: String,
        node: String,
        detail: String,
    },

    /// A pattern edge names a label that was never declared, or a label is
    /// declared twice.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// A replacement asked a match for a label it does not bind.
    #[error("match has no node labelled '{0}'")]
    MissingLabel(String),

    /// A structural graph error raised inside a replacement.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl RewriteError {
    /// Returns `true` for failures a driver may record and continue past.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RewriteError::RewriteFailed { .. })
    }
}
