// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `Tile`: input 0 is the tensor, input 1 the per-axis repeat counts.
//!
//! The input shape and the repeats are right-aligned, the shorter one padded
//! with `1`s, so the output rank is the larger of the two.

use super::{folded_len, unravel};
use crate::{InferContext, InferError};
use shape_core::{Dim, PartialShape, TensorValue};

pub(crate) fn infer(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(2)?;
    let input = ctx.input_shape(0)?;
    ctx.forward_data_type(0, 0)?;

    let Some(repeats) = ctx.input_value(1)?.and_then(|v| v.to_i64_vec()) else {
        // Only the length of the repeats input is known, if anything.
        let repeats_len = ctx.input_shape(1)?.dim(0).ok().and_then(Dim::as_static);
        let shape = match (input.rank(), repeats_len) {
            (Some(rank), Some(len)) => PartialShape::dynamic(rank.max(len as usize)),
            _ => PartialShape::Unknown,
        };
        ctx.set_output_value(0, None)?;
        return ctx.set_output_shape(0, shape);
    };
    if let Some(&r) = repeats.iter().find(|&&r| r < 0) {
        return Err(ctx.error(format!("negative repeat count {r} in {repeats:?}")));
    }

    let shape = tile_shape(&input, &repeats);
    ctx.set_output_shape(0, shape)?;
    let value = ctx.input_value(0)?.and_then(|v| tile_value(&v, &repeats));
    ctx.set_output_value(0, value)
}

/// Output shape of tiling `input` by `repeats` (all non-negative).
pub fn tile_shape(input: &PartialShape, repeats: &[i64]) -> PartialShape {
    let Some(dims) = input.dims() else {
        return PartialShape::Unknown;
    };
    let (dims, repeats) = align(dims.to_vec(), repeats.to_vec());
    PartialShape::from_dims(
        dims.into_iter()
            .zip(repeats)
            .map(|(d, r)| d * Dim::Static(r as u64)),
    )
}

fn align(mut dims: Vec<Dim>, mut repeats: Vec<i64>) -> (Vec<Dim>, Vec<i64>) {
    while dims.len() < repeats.len() {
        dims.insert(0, Dim::Static(1));
    }
    while repeats.len() < dims.len() {
        repeats.insert(0, 1);
    }
    (dims, repeats)
}

fn tile_value(value: &TensorValue, repeats: &[i64]) -> Option<TensorValue> {
    let (dims, repeats) = align(
        value.shape().iter().map(|&d| Dim::Static(d)).collect(),
        repeats.to_vec(),
    );
    let in_shape: Vec<u64> = dims.iter().filter_map(|d| d.as_static()).collect();
    let out_shape: Vec<u64> = in_shape
        .iter()
        .zip(&repeats)
        .map(|(&d, &r)| d.checked_mul(u64::try_from(r).ok()?))
        .collect::<Option<_>>()?;
    let count = folded_len(&out_shape)?;

    let data = (0..count)
        .map(|flat| {
            let offset = unravel(flat, &out_shape)
                .iter()
                .zip(&in_shape)
                .fold(0usize, |acc, (&i, &d)| acc * d as usize + i % d as usize);
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
    fn test_tile_shape() {
        let input = PartialShape::from_dims([Dim::Static(2), Dim::Dynamic]);
        assert_eq!(
            tile_shape(&input, &[3, 2]),
            PartialShape::from_dims([Dim::Static(6), Dim::Dynamic])
        );
        assert_eq!(
            tile_shape(&input, &[4, 1, 1]),
            PartialShape::from_dims([Dim::Static(4), Dim::Static(2), Dim::Dynamic])
        );
        assert_eq!(
            tile_shape(&PartialShape::static_shape(&[2, 3, 4]), &[2]),
            PartialShape::static_shape(&[2, 3, 8])
        );
        assert_eq!(tile_shape(&PartialShape::Unknown, &[2]), PartialShape::Unknown);
    }

    #[test]
    fn test_tile_value() {
        // [[1, 2]] tiled (2, 2) -> [[1, 2, 1, 2], [1, 2, 1, 2]]
        let v = TensorValue::new(vec![1, 2], vec![Element::Int(1), Element::Int(2)]).unwrap();
        let t = tile_value(&v, &[2, 2]).unwrap();
        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.to_i64_vec(), Some(vec![1, 2, 1, 2, 1, 2, 1, 2]));
    }

    #[test]
    fn test_tile_value_too_large_is_not_folded() {
        let v = TensorValue::from_i64(&[3]);
        assert_eq!(tile_value(&v, &[i64::MAX]), None);
        let wide = TensorValue::new(vec![2], vec![Element::Int(1); 2]).unwrap();
        assert_eq!(tile_value(&wide, &[i64::MAX]), None);
        assert_eq!(tile_value(&v, &[crate::ops::MAX_FOLDED_ELEMENTS as i64 + 1]), None);
    }

    #[test]
    fn test_tile_value_rank_extension() {
        let v = TensorValue::from_i64(&[5, 6]);
        let t = tile_value(&v, &[2, 1]).unwrap();
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.to_i64_vec(), Some(vec![5, 6, 5, 6]));
    }
}
