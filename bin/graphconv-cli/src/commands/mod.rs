// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod convert;
pub mod infer;
pub mod inspect;

use graph_ir::{Graph, GraphDescription};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads and builds a JSON graph description.
pub fn load_graph(path: &Path) -> anyhow::Result<Graph> {
    let description = GraphDescription::from_file(path)
        .map_err(|e| anyhow::anyhow!("failed to load graph from '{}': {e}", path.display()))?;
    Ok(description.build()?)
}

/// Prints one line per data node: name, shape, type and value.
pub fn print_shapes(graph: &Graph) {
    println!("  {:<36} {:<20} {:<6} Value", "Data node", "Shape", "Type");
    println!("  {}", "-".repeat(76));
    for node in graph.nodes().filter(|n| n.is_data()) {
        let shape = node.shape().map(ToString::to_string).unwrap_or_default();
        let dtype = node.data_type().map(|d| d.as_str()).unwrap_or("-");
        let value = node.value().map(ToString::to_string).unwrap_or_default();
        println!(
            "  {:<36} {:<20} {:<6} {}",
            truncate(node.name(), 36),
            shape,
            dtype,
            truncate(&value, 40)
        );
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
