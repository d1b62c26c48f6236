// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Compile-time tensor values.
//!
//! A [`TensorValue`] is attached to data nodes whose contents are known
//! while converting (constants, folded shape computations). Individual
//! elements may still be unknown, which is what [`Element::Dynamic`] encodes.

use crate::{PartialShape, ShapeError};
use std::fmt;

/// A single scalar element of a [`TensorValue`].
///
/// Serialized untagged: JSON `true`, `3`, `2.5`, or `null` for dynamic.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Element {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Element value not known at compile time.
    Dynamic,
}

impl Element {
    /// Returns the element as an integer if it is one.
    pub fn as_int(self) -> Option<i64> {
        match self {
            Element::Int(v) => Some(v),
            Element::Bool(b) => Some(i64::from(b)),
            _ => None,
        }
    }

    /// Returns the element as a float, widening integers.
    pub fn as_float(self) -> Option<f64> {
        match self {
            Element::Float(v) => Some(v),
            Element::Int(v) => Some(v as f64),
            Element::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Element::Dynamic => None,
        }
    }

    /// Truthiness as used by `NonZero`; `None` for a dynamic element.
    pub fn is_nonzero(self) -> Option<bool> {
        match self {
            Element::Bool(b) => Some(b),
            Element::Int(v) => Some(v != 0),
            Element::Float(v) => Some(v != 0.0),
            Element::Dynamic => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Bool(b) => write!(f, "{b}"),
            Element::Int(v) => write!(f, "{v}"),
            Element::Float(v) => write!(f, "{v}"),
            Element::Dynamic => f.write_str("?"),
        }
    }
}

/// A dense, row-major tensor with a fully static shape.
///
/// `data` always fills `shape` exactly; deserialization goes through
/// [`TensorValue::new`] and rejects anything else.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawTensorValue")]
pub struct TensorValue {
    shape: Vec<u64>,
    data: Vec<Element>,
}

/// Unchecked wire form of a [`TensorValue`].
#[derive(serde::Deserialize)]
struct RawTensorValue {
    shape: Vec<u64>,
    data: Vec<Element>,
}

impl TryFrom<RawTensorValue> for TensorValue {
    type Error = ShapeError;

    fn try_from(raw: RawTensorValue) -> Result<Self, Self::Error> {
        TensorValue::new(raw.shape, raw.data)
    }
}

impl TensorValue {
    /// Creates a value, checking that `data` fills `shape` exactly.
    ///
    /// # Errors
    /// - [`ShapeError::ElementCountOverflow`] when the product of `shape`
    ///   does not fit in a `u64`.
    /// - [`ShapeError::ValueSizeMismatch`] when the element count differs
    ///   from the product of `shape`.
    pub fn new(shape: Vec<u64>, data: Vec<Element>) -> Result<Self, ShapeError> {
        let expected = element_count(&shape)
            .ok_or_else(|| ShapeError::ElementCountOverflow(shape.clone()))?;
        if expected != data.len() as u64 {
            return Err(ShapeError::ValueSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a rank-1 `i64` value.
    pub fn from_i64(values: &[i64]) -> Self {
        Self {
            shape: vec![values.len() as u64],
            data: values.iter().map(|&v| Element::Int(v)).collect(),
        }
    }

    /// Creates a rank-0 `i64` value.
    pub fn scalar_i64(value: i64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![Element::Int(value)],
        }
    }

    /// Returns the static shape of the value.
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Returns the shape as a [`PartialShape`].
    pub fn partial_shape(&self) -> PartialShape {
        PartialShape::static_shape(&self.shape)
    }

    /// Returns the flat element buffer.
    pub fn data(&self) -> &[Element] {
        &self.data
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the value holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if every element is known.
    pub fn is_fully_known(&self) -> bool {
        self.data.iter().all(|e| !matches!(e, Element::Dynamic))
    }

    /// Reads the value as a flat list of integers.
    ///
    /// Returns `None` if any element is not an integer (or dynamic).
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        self.data.iter().map(|e| e.as_int()).collect()
    }

    /// Row-major strides for the value's shape.
    pub fn strides(&self) -> Vec<usize> {
        row_major_strides(&self.shape)
    }
}

/// Number of elements of a static shape, `None` on `u64` overflow.
pub fn element_count(shape: &[u64]) -> Option<u64> {
    shape.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
}

/// Computes row-major (C-order) strides for `shape`.
pub fn row_major_strides(shape: &[u64]) -> Vec<usize> {
    let rank = shape.len();
    if rank == 0 {
        return Vec::new();
    }
    let mut strides = vec![0usize; rank];
    strides[rank - 1] = 1;
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] as usize;
    }
    strides
}

impl fmt::Display for TensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", PartialShape::static_shape(&self.shape))?;
        for (i, e) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if i == 8 {
                write!(f, "...")?;
                break;
            }
            write!(f, "{e}")?;
        }
        write!(f, "}}")
    }
}
