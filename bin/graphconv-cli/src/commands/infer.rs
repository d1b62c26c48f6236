// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `graphconv infer`: shape inference without any rewriting.

use super::{load_graph, print_shapes};
use shape_infer::{infer_graph, InferenceRegistry};
use std::path::PathBuf;

pub fn execute(graph: PathBuf) -> anyhow::Result<()> {
    let mut g = load_graph(&graph)?;
    let registry = InferenceRegistry::with_default_ops();
    let report = infer_graph(&mut g, &registry)?;

    println!("  {}", report.summary());
    for failure in &report.failures {
        println!("  ! {}", failure.message);
    }
    for name in &report.skipped {
        println!("  - skipped '{name}'");
    }
    println!();
    print_shapes(&g);

    if !report.is_clean() {
        anyhow::bail!("shape inference failed for {} node(s)", report.failures.len());
    }
    Ok(())
}
