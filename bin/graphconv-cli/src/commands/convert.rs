// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `graphconv convert`: apply the configured rules and shape inference.

use super::{load_graph, print_shapes};
use converter::{Converter, ConverterConfig};
use std::path::PathBuf;

pub fn execute(
    config: Option<PathBuf>,
    graph: PathBuf,
    output: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => ConverterConfig::from_file(&path)?,
        None => ConverterConfig::default(),
    };
    let input = load_graph(&graph)?;

    let converter = Converter::new(config)?;
    let rules = converter.rule_names().join(", ");
    let result = converter.load(input).run()?;

    if json {
        println!("{}", result.report.to_json()?);
    } else {
        println!("╔══════════════════════════════════════════════════════╗");
        println!("║               graphconv · Conversion                 ║");
        println!("╚══════════════════════════════════════════════════════╝");
        println!();
        println!("  Input: {}", graph.display());
        println!("  Rules: [{rules}]");
        println!();
        print!("{}", result.report.summary());
        println!();
        println!("  {}", result.graph.summary());
        println!();
        print_shapes(&result.graph);
    }

    if let Some(path) = output {
        let description = result.graph.to_description().to_json()?;
        std::fs::write(&path, description)
            .map_err(|e| anyhow::anyhow!("cannot write '{}': {e}", path.display()))?;
        tracing::info!("wrote converted graph to '{}'", path.display());
    }

    if !result.report.is_clean() {
        tracing::warn!("{} failure(s) recorded", result.report.failures.len());
    }
    Ok(())
}
