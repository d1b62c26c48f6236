// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph boundary operations: `Parameter`, `Const` and `Result`.

use crate::{InferContext, InferError};
use graph_ir::AttrValue;

/// `Parameter` takes its shape from the `shape` attribute when present and
/// otherwise keeps whatever its output data node already declares.
pub(crate) fn infer_parameter(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(0)?;
    if let Some(attr) = ctx.attr("shape") {
        let shape = attr
            .as_shape()
            .ok_or_else(|| ctx.error(format!("invalid shape attribute {attr}")))?;
        ctx.set_output_shape(0, shape)?;
    }
    if let Some(dt) = ctx.attr("data_type").and_then(AttrValue::as_dtype) {
        ctx.set_output_data_type(0, Some(dt))?;
    }
    Ok(())
}

/// `Const` publishes its `value` attribute, or validates the value already
/// stored on its output data node.
pub(crate) fn infer_const(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(0)?;
    let value = match ctx.attr("value") {
        Some(attr) => attr
            .as_value()
            .cloned()
            .ok_or_else(|| ctx.error(format!("value attribute is a {}", attr.type_name())))?,
        None => ctx
            .output_value(0)?
            .ok_or_else(|| ctx.error("constant has no value"))?,
    };
    ctx.set_output_constant(0, value)?;
    if let Some(dt) = ctx.attr("data_type").and_then(AttrValue::as_dtype) {
        ctx.set_output_data_type(0, Some(dt))?;
    }
    Ok(())
}

/// `Result` has exactly one input and produces nothing.
pub(crate) fn infer_result(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(1)
}
