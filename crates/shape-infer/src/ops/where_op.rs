// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `Where`.
//!
//! With one input it returns the coordinates of true elements as
//! `[count, rank]`, which is `NonZero` transposed. With three inputs it is an
//! element-wise select and the output is the broadcast of all three shapes.

use super::nonzero::nonzero_coordinates;
use crate::{InferContext, InferError};
use shape_core::{DType, Dim, Element, PartialShape, TensorValue};

pub(crate) fn infer(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    match ctx.input_count()? {
        1 => infer_indices(ctx),
        3 => infer_select(ctx),
        n => Err(ctx.error(format!("expected 1 or 3 inputs, found {n}"))),
    }
}

fn infer_indices(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(1)?;
    ctx.set_output_data_type(0, Some(DType::I64))?;
    let input = ctx.input_shape(0)?;
    let rank = input.rank().map_or(Dim::Dynamic, Dim::from);

    match ctx.input_value(0)?.and_then(|v| nonzero_coordinates(&v)) {
        Some(coords) => {
            let shape = vec![coords.points.len() as u64, coords.rank as u64];
            let data = coords.points.into_iter().flatten().map(Element::Int).collect();
            let value = TensorValue::new(shape, data).map_err(|e| ctx.error(e))?;
            ctx.set_output_constant(0, value)
        }
        None => {
            ctx.set_output_value(0, None)?;
            ctx.set_output_shape(0, PartialShape::from_dims([Dim::Dynamic, rank]))
        }
    }
}

fn infer_select(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(3)?;
    let mut shape = ctx.input_shape(0)?;
    for port in 1..3 {
        let next = ctx.input_shape(port)?;
        shape = PartialShape::broadcast(&shape, &next)
            .map_err(|e| ctx.error(format!("input {port}: {e}")))?;
    }
    ctx.set_output_value(0, None)?;
    ctx.set_output_shape(0, shape)?;
    ctx.forward_data_type(1, 0)
}
