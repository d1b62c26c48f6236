// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The view an inference function gets of the node it is inferring.

use crate::InferError;
use graph_ir::{AttrValue, Graph, NodeId};
use shape_core::{DType, PartialShape, TensorValue};
use std::fmt;

/// Read access to a node's inputs and attributes, write access to its
/// output data nodes.
///
/// Output writes go through the graph's non-invalidating writers, so
/// inference never re-marks downstream nodes stale.
pub struct InferContext<'g> {
    graph: &'g mut Graph,
    node: NodeId,
    name: String,
    op: String,
}

impl<'g> InferContext<'g> {
    pub(crate) fn new(graph: &'g mut Graph, node: NodeId) -> Result<Self, InferError> {
        let view = graph.node(node)?;
        let op = view
            .op()
            .ok_or_else(|| graph_ir::GraphError::NotAnOperation(view.name().to_string()))?
            .to_string();
        let name = view.name().to_string();
        Ok(Self {
            graph,
            node,
            name,
            op,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> &str {
        &self.op
    }

    /// Builds a [`InferError::ShapeInference`] naming this node.
    pub fn error(&self, detail: impl fmt::Display) -> InferError {
        InferError::ShapeInference {
            node: self.name.clone(),
            op: self.op.clone(),
            detail: detail.to_string(),
        }
    }

    // ── Attributes ─────────────────────────────────────────────────

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.graph.get_attr(self.node, key).ok()
    }

    /// Returns `true` if a flag attribute is present and truthy.
    pub fn has_and_set(&self, key: &str) -> bool {
        self.attr(key).and_then(AttrValue::as_bool).unwrap_or(false)
    }

    // ── Inputs ─────────────────────────────────────────────────────

    /// Number of connected input ports.
    pub fn input_count(&self) -> Result<usize, InferError> {
        Ok(self.graph.inputs_of(self.node)?.len())
    }

    /// Returns `true` if input `port` has a data node attached.
    pub fn has_input(&self, port: usize) -> Result<bool, InferError> {
        Ok(self.graph.in_data(self.node, port)?.is_some())
    }

    /// Fails unless exactly `count` inputs are connected on ports `0..count`.
    pub fn expect_inputs(&self, count: usize) -> Result<(), InferError> {
        let ports: Vec<usize> = self
            .graph
            .inputs_of(self.node)?
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        if ports != (0..count).collect::<Vec<_>>() {
            return Err(self.error(format!(
                "expected {count} input(s) on ports 0..{count}, found ports {ports:?}"
            )));
        }
        Ok(())
    }

    fn input(&self, port: usize) -> Result<graph_ir::Node<'_>, InferError> {
        let data = self
            .graph
            .in_data(self.node, port)?
            .ok_or_else(|| self.error(format!("input port {port} is not connected")))?;
        Ok(self.graph.node(data)?)
    }

    /// Shape of the data node on input `port`.
    pub fn input_shape(&self, port: usize) -> Result<PartialShape, InferError> {
        let node = self.input(port)?;
        Ok(node.shape().cloned().unwrap_or_default())
    }

    /// Compile-time value on input `port`, if any.
    pub fn input_value(&self, port: usize) -> Result<Option<TensorValue>, InferError> {
        Ok(self.input(port)?.value().cloned())
    }

    /// Declared element type on input `port`, if any.
    pub fn input_data_type(&self, port: usize) -> Result<Option<DType>, InferError> {
        Ok(self.input(port)?.data_type())
    }

    // ── Outputs ────────────────────────────────────────────────────

    /// Current shape of the data node on output `port`, if connected.
    pub fn output_shape(&self, port: usize) -> Result<Option<PartialShape>, InferError> {
        match self.graph.out_data(self.node, port)? {
            Some(data) => Ok(self.graph.node(data)?.shape().cloned()),
            None => Ok(None),
        }
    }

    /// Current value of the data node on output `port`, if any.
    pub fn output_value(&self, port: usize) -> Result<Option<TensorValue>, InferError> {
        match self.graph.out_data(self.node, port)? {
            Some(data) => Ok(self.graph.node(data)?.value().cloned()),
            None => Ok(None),
        }
    }

    /// Writes the shape of output `port`. An unconnected port is ignored.
    pub fn set_output_shape(&mut self, port: usize, shape: PartialShape) -> Result<(), InferError> {
        if let Some(data) = self.graph.out_data(self.node, port)? {
            tracing::trace!("{}: output {port} shape {shape}", self.name);
            self.graph.set_inferred_shape(data, shape)?;
        }
        Ok(())
    }

    /// Writes (or clears) the value of output `port`.
    pub fn set_output_value(&mut self, port: usize, value: Option<TensorValue>) -> Result<(), InferError> {
        if let Some(data) = self.graph.out_data(self.node, port)? {
            self.graph.set_inferred_value(data, value)?;
        }
        Ok(())
    }

    /// Writes a known value together with its shape.
    pub fn set_output_constant(&mut self, port: usize, value: TensorValue) -> Result<(), InferError> {
        self.set_output_shape(port, value.partial_shape())?;
        self.set_output_value(port, Some(value))
    }

    /// Writes the element type of output `port`.
    pub fn set_output_data_type(&mut self, port: usize, data_type: Option<DType>) -> Result<(), InferError> {
        if let Some(data) = self.graph.out_data(self.node, port)? {
            self.graph.set_inferred_data_type(data, data_type)?;
        }
        Ok(())
    }

    /// Copies the element type of input `from` to output `to` when known.
    pub fn forward_data_type(&mut self, from: usize, to: usize) -> Result<(), InferError> {
        if let Some(dt) = self.input_data_type(from)? {
            self.set_output_data_type(to, Some(dt))?;
        }
        Ok(())
    }
}
