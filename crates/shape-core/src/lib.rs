// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # shape-core
//!
//! Shape and value model for graph conversion, where any dimension or
//! element may be statically unknown.
//!
//! This crate provides:
//! - [`Dim`]: a dimension that is either a concrete size or dynamic.
//! - [`PartialShape`]: an ordered list of [`Dim`]s, or an unknown rank.
//! - [`TensorValue`]: a compile-time constant tensor of [`Element`]s.
//! - [`DType`]: element types declared on data nodes.
//!
//! # Dynamic semantics
//! Arithmetic yields dynamic as soon as one operand is dynamic, and a
//! dynamic dimension is never treated as a hard mismatch: compatibility
//! checks ([`Dim::compatible`], [`PartialShape::compatible`]) and
//! broadcasting ([`PartialShape::broadcast`]) treat it as "not provably
//! unequal".
//!
//! ```
//! use shape_core::{Dim, PartialShape};
//!
//! let a = PartialShape::from_dims([Dim::Static(5), Dim::Static(1), Dim::Dynamic]);
//! let b = PartialShape::static_shape(&[3, 4]);
//! let c = PartialShape::broadcast(&a, &b).unwrap();
//! assert_eq!(c, PartialShape::from_dims([Dim::Static(5), Dim::Static(3), Dim::Dynamic]));
//! ```

mod dim;
mod dtype;
mod error;
mod shape;
mod value;

pub use dim::Dim;
pub use dtype::DType;
pub use error::ShapeError;
pub use shape::{normalize_axis, PartialShape};
pub use value::{element_count, row_major_strides, Element, TensorValue};
