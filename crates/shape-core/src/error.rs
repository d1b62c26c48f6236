// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape and value arithmetic.

use crate::Dim;

/// Errors raised by [`crate::Dim`], [`crate::PartialShape`] and
/// [`crate::TensorValue`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// Two static dimensions cannot be broadcast together.
    #[error("cannot broadcast dimension {lhs} with {rhs}")]
    BroadcastMismatch { lhs: u64, rhs: u64 },

    /// The operation needs a known rank.
    #[error("shape rank is unknown")]
    UnknownRank,

    /// An axis index lies outside `[-rank, rank)`.
    #[error("axis {axis} out of range for rank {rank}")]
    AxisOutOfRange { axis: i64, rank: usize },

    /// A serialized dimension was negative but not `-1`.
    #[error("invalid dimension value {0}")]
    InvalidDim(i64),

    /// An operand has fewer dimensions than the operation requires.
    #[error("rank {actual} is below the required minimum of {min}")]
    RankTooLow { min: usize, actual: usize },

    /// Two dimensions that must agree are provably different.
    #[error("{context}: dimension {lhs} does not match {rhs}")]
    DimMismatch {
        context: &'static str,
        lhs: Dim,
        rhs: Dim,
    },

    /// Value data does not fill its declared shape.
    #[error("value has {actual} elements, shape requires {expected}")]
    ValueSizeMismatch { expected: u64, actual: usize },

    /// The element count of a value shape does not fit in 64 bits.
    #[error("element count of shape {0:?} overflows")]
    ElementCountOverflow(Vec<u64>),

    /// A static dimension too large for its signed serialized form.
    #[error("dimension {0} exceeds i64::MAX")]
    DimOverflow(u64),
}
