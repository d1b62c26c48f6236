// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graphconv
//!
//! Command-line interface for the graph conversion pipeline.
//!
//! ## Usage
//! ```bash
//! # Apply the configured rewrite rules and shape inference
//! graphconv convert --graph model.json --output converted.json
//!
//! # Print nodes, edges and shapes
//! graphconv inspect --graph model.json
//!
//! # Shape inference only
//! graphconv infer --graph model.json
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "graphconv",
    about = "Graph rewriting and shape inference for model conversion",
    version,
    author
)]
struct Cli {
    /// Path to a TOML converter configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rewrite rules and shape inference on a graph description.
    Convert {
        /// Path to the JSON graph description.
        #[arg(short, long)]
        graph: PathBuf,

        /// Write the converted graph description here.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Print the nodes, edges and shapes of a graph description.
    Inspect {
        /// Path to the JSON graph description.
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Run shape inference only and print the resulting shapes.
    Infer {
        /// Path to the JSON graph description.
        #[arg(short, long)]
        graph: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert { graph, output, json } => {
            commands::convert::execute(cli.config, graph, output, json)
        }
        Commands::Inspect { graph } => commands::inspect::execute(graph),
        Commands::Infer { graph } => commands::infer::execute(graph),
    }
}
