// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Registry of shape inference functions keyed by operation kind.

use crate::{ops, InferContext, InferError};
use graph_ir::{Graph, NodeId};
use std::collections::HashMap;
use std::fmt;

/// Signature every inference function implements.
pub type InferFn = dyn Fn(&mut InferContext<'_>) -> Result<(), InferError> + Send + Sync;

/// Maps each operation kind to exactly one inference function.
///
/// # Example
/// ```
/// use shape_infer::InferenceRegistry;
///
/// let mut registry = InferenceRegistry::with_default_ops();
/// assert!(registry.contains("MatMul"));
/// registry.register("Identity", |ctx| {
///     let shape = ctx.input_shape(0)?;
///     ctx.set_output_shape(0, shape)
/// }).unwrap();
/// assert!(registry.register("Identity", |_| Ok(())).is_err());
/// ```
#[derive(Default)]
pub struct InferenceRegistry {
    functions: HashMap<String, Box<InferFn>>,
}

impl InferenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in operation catalogue.
    pub fn with_default_ops() -> Self {
        let mut registry = Self::new();
        ops::register_defaults(&mut registry);
        registry
    }

    /// Registers the inference function for `op`.
    ///
    /// # Errors
    /// [`InferError::DuplicateOperation`] if `op` already has one.
    pub fn register<F>(&mut self, op: impl Into<String>, f: F) -> Result<(), InferError>
    where
        F: Fn(&mut InferContext<'_>) -> Result<(), InferError> + Send + Sync + 'static,
    {
        let op = op.into();
        if self.functions.contains_key(&op) {
            return Err(InferError::DuplicateOperation(op));
        }
        self.functions.insert(op, Box::new(f));
        Ok(())
    }

    pub(crate) fn insert_builtin(&mut self, op: &str, f: fn(&mut InferContext<'_>) -> Result<(), InferError>) {
        self.functions.insert(op.to_string(), Box::new(f));
    }

    pub fn contains(&self, op: &str) -> bool {
        self.functions.contains_key(op)
    }

    /// Registered operation kinds, sorted.
    pub fn ops(&self) -> Vec<&str> {
        let mut ops: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        ops.sort_unstable();
        ops
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Infers the outputs of a single operation node.
    ///
    /// On success the node and its output data nodes are marked fresh.
    ///
    /// # Errors
    /// - [`InferError::UnknownOperation`] if nothing is registered for the op.
    /// - [`InferError::ShapeInference`] from the inference function.
    /// - [`InferError::Graph`] for stale handles or non-operation nodes.
    pub fn infer(&self, graph: &mut Graph, node: NodeId) -> Result<(), InferError> {
        let mut ctx = InferContext::new(graph, node)?;
        let f = self
            .functions
            .get(ctx.op())
            .ok_or_else(|| InferError::UnknownOperation {
                node: ctx.name().to_string(),
                op: ctx.op().to_string(),
            })?;
        f(&mut ctx)?;
        tracing::debug!("inferred '{}' ({})", ctx.name(), ctx.op());

        graph.mark_fresh(node)?;
        for (_, data) in graph.outputs_of(node)? {
            graph.mark_fresh(data)?;
        }
        Ok(())
    }
}

impl fmt::Debug for InferenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceRegistry")
            .field("ops", &self.ops())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_ir::GraphBuilder;
    use shape_core::PartialShape;

    fn identity_graph(op: &str) -> Graph {
        GraphBuilder::new("id")
            .data("x").shape(&[2, 3])
            .op("id", op)
            .data("y")
            .chain(&["x", "id", "y"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_duplicate_registration() {
        let mut r = InferenceRegistry::new();
        r.register("Identity", |_| Ok(())).unwrap();
        assert!(matches!(
            r.register("Identity", |_| Ok(())),
            Err(InferError::DuplicateOperation(op)) if op == "Identity"
        ));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_unknown_operation() {
        let mut g = identity_graph("Mystery");
        let node = g.node_by_name("id").unwrap();
        let err = InferenceRegistry::new().infer(&mut g, node).unwrap_err();
        assert!(matches!(err, InferError::UnknownOperation { ref op, .. } if op == "Mystery"));
        assert!(err.is_recoverable());
        assert!(g.is_stale(node).unwrap());
    }

    #[test]
    fn test_infer_writes_output_and_clears_staleness() {
        let mut r = InferenceRegistry::new();
        r.register("Identity", |ctx: &mut InferContext<'_>| {
            let shape = ctx.input_shape(0)?;
            ctx.set_output_shape(0, shape)
        })
        .unwrap();

        let mut g = identity_graph("Identity");
        let node = g.node_by_name("id").unwrap();
        let y = g.node_by_name("y").unwrap();
        r.infer(&mut g, node).unwrap();
        assert_eq!(
            g.node(y).unwrap().shape(),
            Some(&PartialShape::static_shape(&[2, 3]))
        );
        assert!(!g.is_stale(node).unwrap());
        assert!(!g.is_stale(y).unwrap());
    }

    #[test]
    fn test_infer_on_data_node_is_structural() {
        let mut g = identity_graph("Identity");
        let x = g.node_by_name("x").unwrap();
        let err = InferenceRegistry::with_default_ops().infer(&mut g, x).unwrap_err();
        assert!(matches!(err, InferError::Graph(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_default_catalogue() {
        let r = InferenceRegistry::with_default_ops();
        for op in ["Parameter", "Const", "Result", "MatMul", "Where", "NonZero", "Transpose", "Tile", "Add"] {
            assert!(r.contains(op), "missing {op}");
        }
    }
}
