// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partially known tensor shapes.

use crate::{Dim, ShapeError};
use std::fmt;

/// Describes the dimensionality of a tensor flowing through the graph.
///
/// A shape is either [`PartialShape::Unknown`] (not even the rank is known)
/// or [`PartialShape::Ranked`], in which case each dimension may still be
/// [`Dim::Dynamic`].
///
/// Serialized as `null` for an unknown rank, or as a list of integers where
/// `-1` marks a dynamic dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "Option<Vec<Dim>>", into = "Option<Vec<Dim>>")]
pub enum PartialShape {
    /// Rank and dimensions unknown.
    #[default]
    Unknown,
    /// Known rank; dimensions may individually be dynamic.
    Ranked(Vec<Dim>),
}

impl PartialShape {
    /// Creates a ranked shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use shape_core::{Dim, PartialShape};
    /// let s = PartialShape::from_dims([Dim::Static(2), Dim::Dynamic]);
    /// assert_eq!(s.rank(), Some(2));
    /// assert!(!s.is_static());
    /// ```
    pub fn from_dims<I: IntoIterator<Item = Dim>>(dims: I) -> Self {
        PartialShape::Ranked(dims.into_iter().collect())
    }

    /// Creates a fully static shape.
    pub fn static_shape(dims: &[u64]) -> Self {
        PartialShape::Ranked(dims.iter().map(|&d| Dim::Static(d)).collect())
    }

    /// Creates a shape of unknown rank.
    pub fn unknown() -> Self {
        PartialShape::Unknown
    }

    /// Creates a ranked shape whose every dimension is dynamic.
    pub fn dynamic(rank: usize) -> Self {
        PartialShape::Ranked(vec![Dim::Dynamic; rank])
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        PartialShape::Ranked(Vec::new())
    }

    /// Returns the rank, or `None` for an unknown rank.
    pub fn rank(&self) -> Option<usize> {
        self.dims().map(<[Dim]>::len)
    }

    /// Returns the dimensions, or `None` for an unknown rank.
    pub fn dims(&self) -> Option<&[Dim]> {
        match self {
            PartialShape::Ranked(dims) => Some(dims),
            PartialShape::Unknown => None,
        }
    }

    /// Returns `true` if the rank is known.
    pub fn is_ranked(&self) -> bool {
        matches!(self, PartialShape::Ranked(_))
    }

    /// Returns `true` if the rank and every dimension are known.
    pub fn is_static(&self) -> bool {
        self.dims()
            .is_some_and(|dims| dims.iter().all(|d| !d.is_dynamic()))
    }

    /// Converts to concrete sizes if the shape is fully static.
    pub fn to_static(&self) -> Option<Vec<u64>> {
        self.dims()?.iter().map(|d| d.as_static()).collect()
    }

    /// Total number of elements; dynamic as soon as any dimension is.
    ///
    /// An unknown rank also yields [`Dim::Dynamic`].
    pub fn num_elements(&self) -> Dim {
        match self.dims() {
            Some(dims) => Dim::product(dims.iter().copied()),
            None => Dim::Dynamic,
        }
    }

    /// Returns `true` when the shapes are not provably different.
    ///
    /// An unknown rank is compatible with anything. Ranked shapes must have
    /// the same rank, and every aligned pair must be [`Dim::compatible`].
    pub fn compatible(&self, other: &PartialShape) -> bool {
        match (self.dims(), other.dims()) {
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.compatible(*y))
            }
            _ => true,
        }
    }

    /// Computes the element-wise broadcast of two shapes.
    ///
    /// Dimensions are aligned from the right, the shorter shape is padded
    /// with `1`s, and each pair goes through [`Dim::broadcast`]. An unknown
    /// rank on either side produces an unknown rank.
    ///
    /// # Errors
    /// [`ShapeError::BroadcastMismatch`] if an aligned pair is statically
    /// incompatible.
    pub fn broadcast(a: &PartialShape, b: &PartialShape) -> Result<PartialShape, ShapeError> {
        let (Some(a), Some(b)) = (a.dims(), b.dims()) else {
            return Ok(PartialShape::Unknown);
        };
        let rank = a.len().max(b.len());
        let mut out = Vec::with_capacity(rank);
        for i in 0..rank {
            let da = aligned(a, rank, i);
            let db = aligned(b, rank, i);
            out.push(da.broadcast(db)?);
        }
        Ok(PartialShape::Ranked(out))
    }

    /// Returns a copy with `dim` inserted at `index` (`index <= rank`).
    ///
    /// # Errors
    /// [`ShapeError::UnknownRank`] or [`ShapeError::AxisOutOfRange`].
    pub fn insert_dim(&self, index: usize, dim: Dim) -> Result<PartialShape, ShapeError> {
        let dims = self.dims().ok_or(ShapeError::UnknownRank)?;
        if index > dims.len() {
            return Err(ShapeError::AxisOutOfRange {
                axis: index as i64,
                rank: dims.len(),
            });
        }
        let mut out = dims.to_vec();
        out.insert(index, dim);
        Ok(PartialShape::Ranked(out))
    }

    /// Returns a copy with the dimension at `axis` removed.
    ///
    /// Negative axes count from the end, as in NumPy.
    pub fn remove_dim(&self, axis: i64) -> Result<PartialShape, ShapeError> {
        let dims = self.dims().ok_or(ShapeError::UnknownRank)?;
        let index = normalize_axis(axis, dims.len())?;
        let mut out = dims.to_vec();
        out.remove(index);
        Ok(PartialShape::Ranked(out))
    }

    /// Returns a copy with the last two dimensions exchanged.
    ///
    /// Shapes of rank < 2 are returned unchanged.
    pub fn swap_last_two(&self) -> Result<PartialShape, ShapeError> {
        let dims = self.dims().ok_or(ShapeError::UnknownRank)?;
        let mut out = dims.to_vec();
        let n = out.len();
        if n >= 2 {
            out.swap(n - 1, n - 2);
        }
        Ok(PartialShape::Ranked(out))
    }

    /// Returns the dimension at `axis` (negative counts from the end).
    pub fn dim(&self, axis: i64) -> Result<Dim, ShapeError> {
        let dims = self.dims().ok_or(ShapeError::UnknownRank)?;
        let index = normalize_axis(axis, dims.len())?;
        Ok(dims[index])
    }
}

fn aligned(dims: &[Dim], rank: usize, i: usize) -> Dim {
    let offset = rank - dims.len();
    if i < offset {
        Dim::Static(1)
    } else {
        dims[i - offset]
    }
}

/// Resolves a possibly negative axis against `rank`.
pub fn normalize_axis(axis: i64, rank: usize) -> Result<usize, ShapeError> {
    let resolved = if axis < 0 { axis + rank as i64 } else { axis };
    if resolved < 0 || resolved >= rank as i64 {
        return Err(ShapeError::AxisOutOfRange { axis, rank });
    }
    Ok(resolved as usize)
}

impl From<Option<Vec<Dim>>> for PartialShape {
    fn from(dims: Option<Vec<Dim>>) -> Self {
        match dims {
            Some(dims) => PartialShape::Ranked(dims),
            None => PartialShape::Unknown,
        }
    }
}

impl From<PartialShape> for Option<Vec<Dim>> {
    fn from(shape: PartialShape) -> Self {
        match shape {
            PartialShape::Ranked(dims) => Some(dims),
            PartialShape::Unknown => None,
        }
    }
}

/// Convenience: `PartialShape::from(vec![Dim::Static(2), Dim::Dynamic])`.
impl From<Vec<Dim>> for PartialShape {
    fn from(dims: Vec<Dim>) -> Self {
        PartialShape::Ranked(dims)
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(dims) = self.dims() else {
            return f.write_str("[...]");
        };
        write!(f, "[")?;
        for (i, d) in dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
