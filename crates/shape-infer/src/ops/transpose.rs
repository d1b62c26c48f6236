// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `Transpose`: input 0 is the tensor, optional input 1 the permutation.
//!
//! Without a permutation input the axes are reversed. A permutation input
//! whose value is not known yields a dynamic shape of the input's rank.

use super::unravel;
use crate::{InferContext, InferError};
use shape_core::{row_major_strides, PartialShape, TensorValue};

pub(crate) fn infer(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    let inputs = ctx.input_count()?;
    if !(1..=2).contains(&inputs) || !ctx.has_input(0)? {
        return Err(ctx.error(format!("expected 1 or 2 inputs, found {inputs}")));
    }
    let reverse_order = ctx.has_and_set("reverse_order");
    let has_perm = ctx.has_input(1)?;
    if reverse_order && has_perm {
        return Err(ctx.error("reverse_order is set but a permutation input is connected"));
    }

    let input = ctx.input_shape(0)?;
    ctx.forward_data_type(0, 0)?;
    let Some(rank) = input.rank() else {
        return ctx.set_output_shape(0, PartialShape::Unknown);
    };

    let perm = if has_perm {
        match ctx.input_value(1)?.and_then(|v| v.to_i64_vec()) {
            Some(raw) => normalize_perm(&raw, rank).map_err(|e| ctx.error(e))?,
            None => {
                ctx.set_output_value(0, None)?;
                return ctx.set_output_shape(0, PartialShape::dynamic(rank));
            }
        }
    } else {
        (0..rank).rev().collect()
    };

    let dims = input.dims().unwrap_or_default();
    let shape = PartialShape::from_dims(perm.iter().map(|&p| dims[p]));
    ctx.set_output_shape(0, shape)?;

    let value = ctx.input_value(0)?.and_then(|v| permute_value(&v, &perm));
    ctx.set_output_value(0, value)
}

/// Validates a permutation and resolves negative axes.
fn normalize_perm(raw: &[i64], rank: usize) -> Result<Vec<usize>, String> {
    if raw.len() != rank {
        return Err(format!("permutation {raw:?} does not match input rank {rank}"));
    }
    let mut seen = vec![false; rank];
    let mut perm = Vec::with_capacity(rank);
    for &axis in raw {
        let resolved = shape_core::normalize_axis(axis, rank).map_err(|e| e.to_string())?;
        if std::mem::replace(&mut seen[resolved], true) {
            return Err(format!("permutation {raw:?} repeats axis {axis}"));
        }
        perm.push(resolved);
    }
    Ok(perm)
}

/// Reorders the axes of a value: output axis `i` is input axis `perm[i]`.
///
/// Returns `None` if `perm` is not a permutation of the value's axes.
pub(crate) fn permute_value(value: &TensorValue, perm: &[usize]) -> Option<TensorValue> {
    let in_shape = value.shape();
    if perm.len() != in_shape.len() || perm.iter().any(|&p| p >= in_shape.len()) {
        return None;
    }
    let out_shape: Vec<u64> = perm.iter().map(|&p| in_shape[p]).collect();
    let in_strides = row_major_strides(in_shape);

    let data = (0..value.len())
        .map(|flat| {
            let out_index = unravel(flat, &out_shape);
            let offset: usize = out_index
                .iter()
                .zip(perm)
                .map(|(&i, &p)| i * in_strides[p])
                .sum();
            value.data()[offset]
        })
        .collect();
    TensorValue::new(out_shape, data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_core::Element;

    #[test]
    fn test_permute_value_2d() {
        // [[1, 2, 3], [4, 5, 6]]^T
        let v = TensorValue::new(vec![2, 3], (1..=6).map(Element::Int).collect()).unwrap();
        let t = permute_value(&v, &[1, 0]).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.to_i64_vec(), Some(vec![1, 4, 2, 5, 3, 6]));
    }

    #[test]
    fn test_permute_value_identity_and_invalid() {
        let v = TensorValue::from_i64(&[7, 8]);
        assert_eq!(permute_value(&v, &[0]), Some(v.clone()));
        assert_eq!(permute_value(&v, &[1]), None);
    }

    #[test]
    fn test_normalize_perm() {
        assert_eq!(normalize_perm(&[1, 0], 2).unwrap(), vec![1, 0]);
        assert_eq!(normalize_perm(&[-1, 0], 2).unwrap(), vec![1, 0]);
        assert!(normalize_perm(&[0, 0], 2).is_err());
        assert!(normalize_perm(&[0], 2).is_err());
        assert!(normalize_perm(&[0, 2], 2).is_err());
    }
}
