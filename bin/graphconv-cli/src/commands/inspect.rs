// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `graphconv inspect`: print the structure of a graph description.

use super::{load_graph, print_shapes, truncate};
use std::path::PathBuf;

pub fn execute(graph: PathBuf) -> anyhow::Result<()> {
    let g = load_graph(&graph)?;

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║                graphconv · Inspector                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {}", g.summary());
    if let Err(e) = g.validate() {
        println!("  Invalid: {e}");
    }
    println!();

    // ── Operations ─────────────────────────────────────────────
    println!("  {:<6} {:<36} {:<16} {:>3} {:>3}", "Id", "Operation", "Op", "In", "Out");
    println!("  {}", "-".repeat(68));
    for id in g.op_nodes() {
        let node = g.node(id)?;
        println!(
            "  {:<6} {:<36} {:<16} {:>3} {:>3}",
            id.to_string(),
            truncate(node.name(), 36),
            node.op().unwrap_or_default(),
            node.in_degree(),
            node.out_degree(),
        );
        for (key, value) in node.attrs() {
            println!("  {:<6}   {key} = {}", "", truncate(&value.to_string(), 50));
        }
    }
    println!();

    // ── Data ───────────────────────────────────────────────────
    print_shapes(&g);
    println!();

    // ── Edges ──────────────────────────────────────────────────
    println!("  Edges:");
    for (_, edge) in g.edges() {
        println!(
            "   {}:{} -> {}:{}",
            g.node(edge.src)?.name(),
            edge.src_port,
            g.node(edge.dst)?.name(),
            edge.dst_port
        );
    }
    Ok(())
}
