// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # shape-infer
//!
//! Computes output shapes (and, where inputs are constant, output values)
//! of operation nodes in a [`graph_ir::Graph`].
//!
//! - [`InferenceRegistry`]: one inference function per operation kind.
//! - [`InferContext`]: what an inference function sees of its node.
//! - [`infer_graph`]: recomputes every stale node in topological order.
//!
//! The built-in catalogue covers `Parameter`, `Const`, `Result`, `MatMul`,
//! `Where`, `NonZero`, `Transpose`, `Tile`, `Add`, `Subtract` and
//! `Multiply`. The pure shape rules for `MatMul` and `Tile` are exported as
//! [`matmul_shape`] and [`tile_shape`].
//!
//! ```
//! use shape_core::PartialShape;
//! use shape_infer::matmul_shape;
//!
//! let a = PartialShape::static_shape(&[5, 2, 3]);
//! let b = PartialShape::static_shape(&[1, 3, 4]);
//! let c = matmul_shape(&a, &b, false, false).unwrap();
//! assert_eq!(c, PartialShape::static_shape(&[5, 2, 4]));
//! ```

mod context;
mod error;
pub mod ops;
mod pass;
mod registry;

pub use context::InferContext;
pub use error::InferError;
pub use ops::{matmul_shape, tile_shape};
pub use pass::{infer_graph, InferFailure, InferReport};
pub use registry::{InferFn, InferenceRegistry};
