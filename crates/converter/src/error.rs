// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the conversion driver.

use crate::PassFailure;

/// Errors that end a conversion attempt.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Two nodes share a name while unique names are required.
    #[error("duplicate node name '{0}'")]
    DuplicateName(String),

    /// A recoverable failure escalated by `abort_on_error`.
    #[error("aborting on {0}")]
    PassFailed(PassFailure),

    /// The caller requested an abort through an [`crate::AbortHandle`].
    #[error("conversion aborted after {completed} of {total} rule(s)")]
    Aborted { completed: usize, total: usize },

    /// A structural graph error.
    #[error("graph error: {0}")]
    GraphError(#[from] graph_ir::GraphError),

    /// A rewrite error that could not be recorded and skipped.
    #[error("rewrite error: {0}")]
    RewriteError(#[from] graph_rewrite::RewriteError),

    /// A shape inference error that could not be recorded and skipped.
    #[error("inference error: {0}")]
    InferError(#[from] shape_infer::InferError),
}
