// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Built-in operation catalogue.
//!
//! Each operation is one plain function; [`register_defaults`] wires them
//! into a registry under their op names.

mod elementwise;
mod io;
mod matmul;
mod nonzero;
mod tile;
mod transpose;
mod where_op;

pub use matmul::matmul_shape;
pub use tile::tile_shape;

use crate::InferenceRegistry;
use shape_core::element_count;

/// Largest number of elements (or multiply-adds, for `MatMul`) constant
/// folding will compute. Bigger results keep their shape but no value.
pub const MAX_FOLDED_ELEMENTS: u64 = 1 << 20;

pub(crate) fn register_defaults(registry: &mut InferenceRegistry) {
    registry.insert_builtin("Parameter", io::infer_parameter);
    registry.insert_builtin("Const", io::infer_const);
    registry.insert_builtin("Result", io::infer_result);
    registry.insert_builtin("MatMul", matmul::infer);
    registry.insert_builtin("Where", where_op::infer);
    registry.insert_builtin("NonZero", nonzero::infer);
    registry.insert_builtin("Transpose", transpose::infer);
    registry.insert_builtin("Tile", tile::infer);
    registry.insert_builtin("Add", elementwise::infer_add);
    registry.insert_builtin("Subtract", elementwise::infer_subtract);
    registry.insert_builtin("Multiply", elementwise::infer_multiply);
}

/// Element count of a folded result, or `None` if it overflows or is
/// above [`MAX_FOLDED_ELEMENTS`].
pub(crate) fn folded_len(shape: &[u64]) -> Option<usize> {
    element_count(shape)
        .filter(|&n| n <= MAX_FOLDED_ELEMENTS)
        .and_then(|n| usize::try_from(n).ok())
}

/// Converts a row-major flat index into a multi-index over `shape`.
pub(crate) fn unravel(mut flat: usize, shape: &[u64]) -> Vec<usize> {
    let mut index = vec![0usize; shape.len()];
    for (slot, &dim) in index.iter_mut().zip(shape).rev() {
        let dim = dim as usize;
        if dim > 0 {
            *slot = flat % dim;
            flat /= dim;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unravel() {
        assert_eq!(unravel(0, &[]), Vec::<usize>::new());
        assert_eq!(unravel(5, &[2, 3]), vec![1, 2]);
        assert_eq!(unravel(7, &[2, 2, 2]), vec![1, 1, 1]);
    }

    #[test]
    fn test_folded_len_limits() {
        assert_eq!(folded_len(&[2, 3]), Some(6));
        assert_eq!(folded_len(&[]), Some(1));
        assert_eq!(folded_len(&[MAX_FOLDED_ELEMENTS]), Some(MAX_FOLDED_ELEMENTS as usize));
        assert_eq!(folded_len(&[MAX_FOLDED_ELEMENTS, 2]), None);
        assert_eq!(folded_len(&[u64::MAX, u64::MAX]), None);
    }
}
