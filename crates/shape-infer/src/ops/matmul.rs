// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Batched matrix multiplication with NumPy `matmul` semantics.
//!
//! Rank-1 operands are promoted (`[K]` becomes `[1, K]` on the left and
//! `[K, 1]` on the right) and the promoted dimension is dropped from the
//! result again. Transpose flags only apply to operands of rank 2 or more.

use super::elementwise::BinaryOp;
use super::{folded_len, transpose::permute_value, unravel};
use crate::{InferContext, InferError};
use shape_core::{Dim, Element, PartialShape, ShapeError, TensorValue};

pub(crate) fn infer(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(2)?;
    let transpose_a = ctx.has_and_set("transpose_a");
    let transpose_b = ctx.has_and_set("transpose_b");
    let a = ctx.input_shape(0)?;
    let b = ctx.input_shape(1)?;

    let shape = matmul_shape(&a, &b, transpose_a, transpose_b).map_err(|e| {
        ctx.error(format!("inputs {a} and {b}: {e}"))
    })?;
    ctx.set_output_shape(0, shape)?;
    ctx.forward_data_type(0, 0)?;

    let value = match (ctx.input_value(0)?, ctx.input_value(1)?) {
        (Some(va), Some(vb)) => matmul_value(&va, &vb, transpose_a, transpose_b),
        _ => None,
    };
    ctx.set_output_value(0, value)
}

/// Computes the output shape of `a @ b`.
///
/// # Errors
/// - [`ShapeError::UnknownRank`] if either rank is unknown.
/// - [`ShapeError::RankTooLow`] for scalar operands.
/// - [`ShapeError::BroadcastMismatch`] for incompatible batch dimensions.
/// - [`ShapeError::DimMismatch`] if the contracted dimensions differ.
pub fn matmul_shape(
    a: &PartialShape,
    b: &PartialShape,
    transpose_a: bool,
    transpose_b: bool,
) -> Result<PartialShape, ShapeError> {
    let a_dims = a.dims().ok_or(ShapeError::UnknownRank)?;
    let b_dims = b.dims().ok_or(ShapeError::UnknownRank)?;
    let (a_rank, b_rank) = (a_dims.len(), b_dims.len());
    for rank in [a_rank, b_rank] {
        if rank == 0 {
            return Err(ShapeError::RankTooLow { min: 1, actual: 0 });
        }
    }

    let (a, b) = promote(a_dims.to_vec(), b_dims.to_vec(), transpose_a, transpose_b);
    let rank = a.len();

    let mut out = Vec::with_capacity(rank);
    for i in 0..rank - 2 {
        out.push(a[i].broadcast(b[i])?);
    }

    let (k_a, k_b) = (a[rank - 1], b[rank - 2]);
    if !k_a.compatible(k_b) {
        return Err(ShapeError::DimMismatch {
            context: "contracted dimensions",
            lhs: k_a,
            rhs: k_b,
        });
    }
    out.push(a[rank - 2]);
    out.push(b[rank - 1]);

    let mut result = PartialShape::Ranked(out);
    if a_rank == 1 {
        result = result.remove_dim(-2)?;
    }
    if b_rank == 1 {
        result = result.remove_dim(-1)?;
    }
    Ok(result)
}

/// Applies transposes, rank-1 promotion and left-padding to a common rank.
///
/// Generic so that it runs over [`Dim`]s and static sizes alike.
fn promote<T: Copy + From<u64>>(
    mut a: Vec<T>,
    mut b: Vec<T>,
    transpose_a: bool,
    transpose_b: bool,
) -> (Vec<T>, Vec<T>) {
    if transpose_a && a.len() != 1 {
        let n = a.len();
        a.swap(n - 1, n - 2);
    }
    if transpose_b && b.len() != 1 {
        let n = b.len();
        b.swap(n - 1, n - 2);
    }
    if a.len() == 1 {
        a.insert(0, T::from(1));
    }
    if b.len() == 1 {
        b.push(T::from(1));
    }
    let rank = a.len().max(b.len());
    for v in [&mut a, &mut b] {
        while v.len() < rank {
            v.insert(0, T::from(1));
        }
    }
    (a, b)
}

/// Folds `a @ b` when both operands are known at compile time.
///
/// Returns `None` if the operands do not multiply.
pub(crate) fn matmul_value(
    a: &TensorValue,
    b: &TensorValue,
    transpose_a: bool,
    transpose_b: bool,
) -> Option<TensorValue> {
    let result_shape = matmul_shape(&a.partial_shape(), &b.partial_shape(), transpose_a, transpose_b)
        .ok()?
        .to_static()?;

    let out_len = folded_len(&result_shape)?;

    let a = if transpose_a { transpose_last_two(a)? } else { a.clone() };
    let b = if transpose_b { transpose_last_two(b)? } else { b.clone() };
    let (a_shape, b_shape) = promote(a.shape().to_vec(), b.shape().to_vec(), false, false);

    let rank = a_shape.len();
    let (m, k, n) = (
        a_shape[rank - 2] as usize,
        a_shape[rank - 1] as usize,
        b_shape[rank - 1] as usize,
    );
    let batch: Vec<u64> = (0..rank - 2).map(|i| a_shape[i].max(b_shape[i])).collect();
    let batch_count = folded_len(&batch)?;
    folded_len(&[out_len as u64, k as u64])?;

    let mut data = Vec::with_capacity(out_len);
    for flat in 0..batch_count {
        let index = unravel(flat, &batch);
        let a_off = batch_offset(&index, &a_shape[..rank - 2]) * m * k;
        let b_off = batch_offset(&index, &b_shape[..rank - 2]) * k * n;
        for i in 0..m {
            for j in 0..n {
                let mut acc = Element::Int(0);
                for p in 0..k {
                    let term = BinaryOp::Multiply.apply(
                        a.data()[a_off + i * k + p],
                        b.data()[b_off + p * n + j],
                    );
                    acc = BinaryOp::Add.apply(acc, term);
                }
                data.push(acc);
            }
        }
    }
    TensorValue::new(result_shape, data).ok()
}

/// Row-major batch offset with size-1 dimensions broadcast.
fn batch_offset(index: &[usize], dims: &[u64]) -> usize {
    index.iter().zip(dims).fold(0, |acc, (&i, &d)| {
        let i = if d == 1 { 0 } else { i };
        acc * d as usize + i
    })
}

fn transpose_last_two(value: &TensorValue) -> Option<TensorValue> {
    let rank = value.shape().len();
    if rank < 2 {
        return Some(value.clone());
    }
    let mut perm: Vec<usize> = (0..rank).collect();
    perm.swap(rank - 1, rank - 2);
    permute_value(value, &perm)
}
