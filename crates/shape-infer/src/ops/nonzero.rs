// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `NonZero`: coordinates of the non-zero input elements, laid out as
//! `[rank, count]` (one row per axis).

use super::unravel;
use crate::{InferContext, InferError};
use shape_core::{DType, Dim, Element, PartialShape, TensorValue};

pub(crate) fn infer(ctx: &mut InferContext<'_>) -> Result<(), InferError> {
    ctx.expect_inputs(1)?;
    let output_type = match ctx.attr("output_type") {
        Some(attr) => Some(
            attr.as_dtype()
                .filter(|dt| matches!(dt, DType::I32 | DType::I64))
                .ok_or_else(|| ctx.error(format!("unsupported output_type {attr}")))?,
        ),
        None => Some(DType::I64),
    };
    ctx.set_output_data_type(0, output_type)?;

    let input = ctx.input_shape(0)?;
    let rank = match input.rank() {
        Some(rank) => Dim::from(rank),
        None => Dim::Dynamic,
    };

    match ctx.input_value(0)?.and_then(|v| nonzero_coordinates(&v)) {
        Some(coords) => {
            let rank = coords.rank;
            let count = coords.points.len();
            // Transpose the point list into one row per axis.
            let data = (0..rank)
                .flat_map(|axis| coords.points.iter().map(move |p| Element::Int(p[axis])))
                .collect();
            let value = TensorValue::new(vec![rank as u64, count as u64], data)
                .map_err(|e| ctx.error(e))?;
            ctx.set_output_constant(0, value)
        }
        None => {
            ctx.set_output_value(0, None)?;
            ctx.set_output_shape(0, PartialShape::from_dims([rank, Dim::Dynamic]))
        }
    }
}

/// Coordinates of the non-zero elements of a value, in row-major order.
pub(crate) struct Coordinates {
    pub(crate) rank: usize,
    pub(crate) points: Vec<Vec<i64>>,
}

/// Returns `None` if any element is unknown.
pub(crate) fn nonzero_coordinates(value: &TensorValue) -> Option<Coordinates> {
    let mut points = Vec::new();
    for (flat, element) in value.data().iter().enumerate() {
        if element.is_nonzero()? {
            points.push(
                unravel(flat, value.shape())
                    .into_iter()
                    .map(|i| i as i64)
                    .collect(),
            );
        }
    }
    Some(Coordinates {
        rank: value.shape().len(),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates() {
        // [[0, 3], [5, 0]]
        let v = TensorValue::new(
            vec![2, 2],
            [0, 3, 5, 0].into_iter().map(Element::Int).collect(),
        )
        .unwrap();
        let coords = nonzero_coordinates(&v).unwrap();
        assert_eq!(coords.rank, 2);
        assert_eq!(coords.points, vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_coordinates_unknown_element() {
        let v = TensorValue::new(vec![2], vec![Element::Int(1), Element::Dynamic]).unwrap();
        assert!(nonzero_coordinates(&v).is_none());
    }
}
