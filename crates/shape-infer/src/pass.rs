// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Whole-graph shape inference.

use crate::{InferError, InferenceRegistry};
use graph_ir::{Graph, NodeId};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// A recoverable per-node inference failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InferFailure {
    pub node: String,
    pub op: String,
    /// `"ShapeInference"` or `"UnknownOperation"`.
    pub kind: String,
    pub message: String,
}

/// Outcome of [`infer_graph`].
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InferReport {
    /// Operation nodes whose outputs were recomputed.
    pub inferred: usize,
    /// Failed operation nodes.
    pub failures: Vec<InferFailure>,
    /// Operation nodes skipped because an upstream node failed.
    pub skipped: Vec<String>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl InferReport {
    /// Returns `true` if nothing failed or was skipped.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "inferred {} node(s), {} failure(s), {} skipped in {:.2} ms",
            self.inferred,
            self.failures.len(),
            self.skipped.len(),
            self.elapsed.as_secs_f64() * 1000.0,
        )
    }
}

/// Recomputes every stale node in topological order.
///
/// Nodes that are not stale are left alone. A recoverable failure on an
/// operation is recorded, the node stays stale, and every operation
/// downstream of it is skipped rather than inferred from stale inputs.
///
/// # Errors
/// Structural graph errors (for example a cycle) abort the pass.
pub fn infer_graph(graph: &mut Graph, registry: &InferenceRegistry) -> Result<InferReport, InferError> {
    let start = Instant::now();
    let mut report = InferReport::default();
    let mut failed: HashSet<NodeId> = HashSet::new();

    for id in graph.topological_order()? {
        let node = graph.node(id)?;
        if !node.is_stale() {
            continue;
        }
        if node.predecessors().iter().any(|p| failed.contains(p)) {
            failed.insert(id);
            if node.is_op() {
                tracing::debug!("skipping '{}': an input failed to infer", node.name());
                report.skipped.push(node.name().to_string());
            }
            continue;
        }
        if node.is_data() {
            // Source data, or data whose producer is already up to date.
            graph.mark_fresh(id)?;
            continue;
        }

        let (name, op) = (node.name().to_string(), node.op().unwrap_or_default().to_string());
        match registry.infer(graph, id) {
            Ok(()) => report.inferred += 1,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("{e}");
                failed.insert(id);
                report.failures.push(InferFailure {
                    node: name,
                    op,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    report.elapsed = start.elapsed();
    tracing::info!("shape inference on '{}': {}", graph.name(), report.summary());
    Ok(report)
}

mod duration_ms {
    use std::time::Duration;

    pub(super) fn serialize<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }
}
