// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Broadcasting binary arithmetic (`Add`, `Subtract`, `Multiply`).

use super::{folded_len, unravel};
use crate::{InferContext, InferError};
use shape_core::{Element, PartialShape, TensorValue};

/// A binary arithmetic operation over [`Element`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
}

impl BinaryOp {
    /// Applies the operation to two elements.
    ///
    /// Integers (and booleans) stay integral with wrapping arithmetic; any
    /// float operand promotes to float. A dynamic operand gives a dynamic
    /// result.
    pub(crate) fn apply(self, a: Element, b: Element) -> Element {
        match (a, b) {
            (Element::Dynamic, _) | (_, Element::Dynamic) => Element::Dynamic,
            (Element::Float(_), _) | (_, Element::Float(_)) => {
                match (a.as_float(), b.as_float()) {
                    (Some(x), Some(y)) => Element::Float(match self {
                        BinaryOp::Add => x + y,
                        BinaryOp::Subtract => x - y,
                        BinaryOp::Multiply => x * y,
                    }),
                    _ => Element::Dynamic,
                }
            }
            _ => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => Element::Int(match self {
                    BinaryOp::Add => x.wrapping_add(y),
                    BinaryOp::Subtract => x.wrapping_sub(y),
                    BinaryOp::Multiply => x.wrapping_mul(y),
                }),
                _ => Element::Dynamic,
            },
        }
    }
}

fn infer_binary(ctx: &mut InferContext<'_>, op: BinaryOp) -> Result<(), InferError> {
    ctx.expect_inputs(2)?;
    let a = ctx.input_shape(0)?;
    let b = ctx.input_shape(1)?;
    let shape = PartialShape::broadcast(&a, &b)
        .map_err(|e| ctx.error(format!("inputs {a} and {b}: {e}")))?;
    ctx.set_output_shape(0, shape)?;
    ctx.forward_data_type(0, 0)?;

    let value = match (ctx.input_value(0)?, ctx.input_value(1)?) {
        (Some(va), Some(vb)) => broadcast_value(&va, &vb, op),
        _ => None,
    };
    ctx.set_output_value(0, value)
}

pub(crate) fn infer_add(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    infer_binary(ctx, BinaryOp::Add)
}

pub(crate) fn infer_subtract(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    infer_binary(ctx, BinaryOp::Subtract)
}

pub(crate) fn infer_multiply(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    infer_binary(ctx, BinaryOp::Multiply)
}

/// Folds a broadcasting binary operation over two known values.
fn broadcast_value(a: &TensorValue, b: &TensorValue, op: BinaryOp) -> Option<TensorValue> {
    let out_shape = PartialShape::broadcast(&a.partial_shape(), &b.partial_shape())
        .ok()?
        .to_static()?;
    let count = folded_len(&out_shape)?;

    let data = (0..count)
        .map(|flat| {
            let index = unravel(flat, &out_shape);
            op.apply(
                a.data()[source_offset(&index, a.shape())],
                b.data()[source_offset(&index, b.shape())],
            )
        })
        .collect();
    TensorValue::new(out_shape, data).ok()
}

/// Maps an output index to the flat offset of a right-aligned,
/// broadcast input.
fn source_offset(index: &[usize], shape: &[u64]) -> usize {
    let skip = index.len() - shape.len();
    index[skip..].iter().zip(shape).fold(0, |acc, (&i, &d)| {
        let i = if d == 1 { 0 } else { i };
        acc * d as usize + i
    })
}
