// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A single tensor dimension that may be statically unknown.
//!
//! Arithmetic on [`Dim`] propagates unknown-ness: as soon as one operand is
//! [`Dim::Dynamic`] the result is dynamic. Equality between a static and a
//! dynamic dimension is *indeterminate*; use [`Dim::compatible`] for semantic
//! checks and reserve `==` for structural comparison of graphs.

use crate::ShapeError;
use std::fmt;
use std::ops::{Add, Mul};

/// One dimension of a [`crate::PartialShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "i64")]
pub enum Dim {
    /// A concrete, non-negative size.
    Static(u64),
    /// Size not known at graph-construction time.
    Dynamic,
}

impl Dim {
    /// Returns `true` for [`Dim::Dynamic`].
    pub fn is_dynamic(self) -> bool {
        matches!(self, Dim::Dynamic)
    }

    /// Returns the concrete size, if known.
    pub fn as_static(self) -> Option<u64> {
        match self {
            Dim::Static(v) => Some(v),
            Dim::Dynamic => None,
        }
    }

    /// Returns `true` if the dimension is statically `1`.
    pub fn is_one(self) -> bool {
        self == Dim::Static(1)
    }

    /// Two dimensions are compatible unless both are static and differ.
    ///
    /// A dynamic dimension is "not provably unequal" to anything.
    pub fn compatible(self, other: Dim) -> bool {
        match (self, other) {
            (Dim::Static(a), Dim::Static(b)) => a == b,
            _ => true,
        }
    }

    /// Broadcasts two dimensions with NumPy rules extended for dynamic sizes.
    ///
    /// - a dynamic operand absorbs the other (`broadcast(d, dynamic) == dynamic`),
    /// - a static `1` yields the other dimension,
    /// - equal static sizes yield that size.
    ///
    /// # Errors
    /// [`ShapeError::BroadcastMismatch`] when both are static, unequal and
    /// neither is `1`.
    pub fn broadcast(self, other: Dim) -> Result<Dim, ShapeError> {
        match (self, other) {
            (Dim::Dynamic, _) | (_, Dim::Dynamic) => Ok(Dim::Dynamic),
            (Dim::Static(1), d) | (d, Dim::Static(1)) => Ok(d),
            (Dim::Static(a), Dim::Static(b)) if a == b => Ok(Dim::Static(a)),
            (Dim::Static(a), Dim::Static(b)) => Err(ShapeError::BroadcastMismatch { lhs: a, rhs: b }),
        }
    }

    /// Multiplies a sequence of dimensions, stopping at the first dynamic one.
    ///
    /// The empty product is `Static(1)`.
    pub fn product<I: IntoIterator<Item = Dim>>(dims: I) -> Dim {
        let mut acc = 1u64;
        for d in dims {
            match d {
                Dim::Static(v) => acc = acc.saturating_mul(v),
                Dim::Dynamic => return Dim::Dynamic,
            }
        }
        Dim::Static(acc)
    }
}

impl Add for Dim {
    type Output = Dim;

    fn add(self, rhs: Dim) -> Dim {
        match (self, rhs) {
            (Dim::Static(a), Dim::Static(b)) => Dim::Static(a.saturating_add(b)),
            _ => Dim::Dynamic,
        }
    }
}

impl Mul for Dim {
    type Output = Dim;

    fn mul(self, rhs: Dim) -> Dim {
        match (self, rhs) {
            (Dim::Static(a), Dim::Static(b)) => Dim::Static(a.saturating_mul(b)),
            _ => Dim::Dynamic,
        }
    }
}

impl From<u64> for Dim {
    fn from(v: u64) -> Self {
        Dim::Static(v)
    }
}

impl From<usize> for Dim {
    fn from(v: usize) -> Self {
        Dim::Static(v as u64)
    }
}

/// `-1` is the serialized form of a dynamic dimension.
impl TryFrom<i64> for Dim {
    type Error = ShapeError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Dim::Dynamic),
            v if v >= 0 => Ok(Dim::Static(v as u64)),
            v => Err(ShapeError::InvalidDim(v)),
        }
    }
}

/// Fails for static sizes above `i64::MAX`, which have no serialized form.
impl TryFrom<Dim> for i64 {
    type Error = ShapeError;

    fn try_from(d: Dim) -> Result<i64, Self::Error> {
        match d {
            Dim::Static(v) => i64::try_from(v).map_err(|_| ShapeError::DimOverflow(v)),
            Dim::Dynamic => Ok(-1),
        }
    }
}

impl serde::Serialize for Dim {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = i64::try_from(*self).map_err(serde::ser::Error::custom)?;
        serializer.serialize_i64(v)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Static(v) => write!(f, "{v}"),
            Dim::Dynamic => f.write_str("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_propagates_dynamic() {
        assert_eq!(Dim::Static(2) + Dim::Static(3), Dim::Static(5));
        assert_eq!(Dim::Static(2) * Dim::Static(3), Dim::Static(6));
        assert_eq!(Dim::Static(2) + Dim::Dynamic, Dim::Dynamic);
        assert_eq!(Dim::Dynamic * Dim::Static(2), Dim::Dynamic);
    }

    #[test]
    fn test_compatible() {
        assert!(Dim::Static(4).compatible(Dim::Static(4)));
        assert!(!Dim::Static(4).compatible(Dim::Static(5)));
        assert!(Dim::Static(4).compatible(Dim::Dynamic));
        assert!(Dim::Dynamic.compatible(Dim::Dynamic));
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(Dim::Static(1).broadcast(Dim::Static(10)).unwrap(), Dim::Static(10));
        assert_eq!(Dim::Static(10).broadcast(Dim::Static(1)).unwrap(), Dim::Static(10));
        assert_eq!(Dim::Static(7).broadcast(Dim::Static(7)).unwrap(), Dim::Static(7));
        assert!(Dim::Static(5).broadcast(Dim::Static(3)).is_err());
    }

    #[test]
    fn test_dynamic_absorbs_in_broadcast() {
        for d in [Dim::Static(0), Dim::Static(1), Dim::Static(42), Dim::Dynamic] {
            assert_eq!(d.broadcast(Dim::Dynamic).unwrap(), Dim::Dynamic);
            assert_eq!(Dim::Dynamic.broadcast(d).unwrap(), Dim::Dynamic);
        }
    }

    #[test]
    fn test_product_short_circuits() {
        assert_eq!(Dim::product([]), Dim::Static(1));
        assert_eq!(Dim::product([Dim::Static(2), Dim::Static(8)]), Dim::Static(16));
        assert_eq!(
            Dim::product([Dim::Static(2), Dim::Dynamic, Dim::Static(0)]),
            Dim::Dynamic
        );
    }

    #[test]
    fn test_i64_conversion() {
        assert_eq!(Dim::try_from(-1i64).unwrap(), Dim::Dynamic);
        assert_eq!(Dim::try_from(3i64).unwrap(), Dim::Static(3));
        assert!(Dim::try_from(-7i64).is_err());
        assert_eq!(i64::try_from(Dim::Dynamic).unwrap(), -1);
        assert_eq!(i64::try_from(Dim::Static(9)).unwrap(), 9);
    }

    #[test]
    fn test_oversized_dim_does_not_wrap() {
        let huge = Dim::Static(u64::MAX);
        assert_eq!(i64::try_from(huge), Err(ShapeError::DimOverflow(u64::MAX)));
        assert!(serde_json::to_string(&huge).is_err());
        assert_eq!(serde_json::to_string(&Dim::Static(i64::MAX as u64)).unwrap(), i64::MAX.to_string());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Dim::Static(12)), "12");
        assert_eq!(format!("{}", Dim::Dynamic), "?");
    }
}
