// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Property tests for dimension and shape broadcasting.

use proptest::prelude::*;
use shape_core::{Dim, PartialShape};

fn dim() -> impl Strategy<Value = Dim> {
    prop_oneof![
        3 => (1u64..4).prop_map(Dim::Static),
        1 => Just(Dim::Dynamic),
    ]
}

fn shape() -> impl Strategy<Value = PartialShape> {
    prop_oneof![
        8 => prop::collection::vec(dim(), 0..5).prop_map(PartialShape::Ranked),
        1 => Just(PartialShape::Unknown),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// `broadcast(a, b) == broadcast(b, a)`, including the error case.
    #[test]
    fn broadcast_is_commutative(a in shape(), b in shape()) {
        let ab = PartialShape::broadcast(&a, &b);
        let ba = PartialShape::broadcast(&b, &a);
        prop_assert_eq!(ab.is_ok(), ba.is_ok());
        if let (Ok(ab), Ok(ba)) = (ab, ba) {
            prop_assert_eq!(ab, ba);
        }
    }

    /// A dynamic dimension absorbs any concrete dimension.
    #[test]
    fn dynamic_absorbs(d in 0u64..1_000_000) {
        prop_assert_eq!(Dim::Static(d).broadcast(Dim::Dynamic).unwrap(), Dim::Dynamic);
        prop_assert_eq!(Dim::Dynamic.broadcast(Dim::Static(d)).unwrap(), Dim::Dynamic);
    }

    /// The broadcast result has the rank of the longer operand.
    #[test]
    fn broadcast_rank_is_max(a in prop::collection::vec(dim(), 0..5), b in prop::collection::vec(dim(), 0..5)) {
        let (ra, rb) = (a.len(), b.len());
        if let Ok(out) = PartialShape::broadcast(&PartialShape::Ranked(a), &PartialShape::Ranked(b)) {
            prop_assert_eq!(out.rank(), Some(ra.max(rb)));
        }
    }

    /// Broadcasting with itself is the identity.
    #[test]
    fn broadcast_self_identity(a in shape()) {
        prop_assert_eq!(PartialShape::broadcast(&a, &a).unwrap(), a);
    }

    /// Compatibility is symmetric.
    #[test]
    fn compatible_is_symmetric(a in shape(), b in shape()) {
        prop_assert_eq!(a.compatible(&b), b.compatible(&a));
    }
}
