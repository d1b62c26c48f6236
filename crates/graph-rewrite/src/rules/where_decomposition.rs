// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Decomposes single-input `Where` into `NonZero` followed by `Transpose`.
//!
//! ```text
//! before:  in ──► Where ──► out ──► consumers
//!
//! after:   in ──► NonZero ──► nz ──► Transpose ──► out ──► consumers
//!                                        ▲ port 1
//!                          Const ──► perm [1, 0]
//! ```
//!
//! `NonZero` yields coordinates as `[rank, count]`; `Where` yields them as
//! `[count, rank]`, hence the fixed `[1, 0]` permutation. The Transpose
//! takes over the original node name so downstream lookups keep working.

use crate::{Match, NodeMatcher, Pattern, RewriteError, RewriteRule};
use graph_ir::{AttrValue, Attrs, Graph};
use shape_core::{DType, PartialShape, TensorValue};

#[derive(Debug, Clone, Copy, Default)]
pub struct WhereDecomposition;

impl WhereDecomposition {
    pub fn new() -> Self {
        Self
    }
}

impl RewriteRule for WhereDecomposition {
    fn name(&self) -> &str {
        "WhereDecomposition"
    }

    fn pattern(&self) -> Pattern {
        Pattern::new()
            .node(
                "where",
                NodeMatcher::op("Where").with_predicate(|n| n.in_degree() == 1),
            )
            .node("input", NodeMatcher::data())
            .node("output", NodeMatcher::data())
            .edge_ports("input", "where", None, Some(0))
            .edge_ports("where", "output", Some(0), None)
    }

    fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError> {
        let where_op = m.node("where")?;
        let input = m.node("input")?;
        let output = m.node("output")?;
        let name = graph.node(where_op)?.name().to_string();

        let mut nz_attrs = Attrs::new();
        nz_attrs.insert("output_type".into(), AttrValue::from(DType::I64));
        let non_zero = graph.add_operation_node(format!("{name}/NonZero_"), "NonZero", nz_attrs);
        let nz_data = graph.add_data_node(format!("{name}/NonZero_:0"), PartialShape::unknown(), None, None);

        let perm = TensorValue::from_i64(&[1, 0]);
        let mut perm_attrs = Attrs::new();
        perm_attrs.insert("value".into(), perm.clone().into());
        let perm_const = graph.add_operation_node(format!("{name}/perm"), "Const", perm_attrs);
        let perm_data = graph.add_data_node(
            format!("{name}/perm:0"),
            PartialShape::static_shape(&[2]),
            Some(perm),
            Some(DType::I64),
        );

        let transpose = graph.add_operation_node(format!("{name}/Transpose_"), "Transpose", Attrs::new());

        graph.disconnect_input(where_op, 0)?;
        graph.connect(input, 0, non_zero, 0)?;
        graph.connect(non_zero, 0, nz_data, 0)?;
        graph.connect(nz_data, 0, transpose, 0)?;
        graph.connect(perm_const, 0, perm_data, 0)?;
        graph.connect(perm_data, 0, transpose, 1)?;

        graph.disconnect_output(where_op, 0)?;
        graph.connect(transpose, 0, output, 0)?;

        graph.remove_node(where_op, true)?;
        graph.rename(transpose, name)?;
        Ok(())
    }
}
