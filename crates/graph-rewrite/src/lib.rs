// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-rewrite
//!
//! Pattern-based structural rewriting of a [`graph_ir::Graph`].
//!
//! A rule pairs a declarative [`Pattern`] with a replacement callback:
//!
//! 1. [`find_matches`] lazily enumerates occurrences (deterministic order).
//! 2. [`apply_rule`] re-checks each occurrence against the current graph,
//!    snapshots the graph, runs the replacement and restores the snapshot
//!    on failure.
//!
//! # Built-in rules
//!
//! | Rule | Rewrites |
//! |---|---|
//! | [`WhereDecomposition`] | `Where(x)` into `Transpose(NonZero(x), [1, 0])` |
//! | [`TileToSeqTiles`] | a multi-axis `Tile` into a chain of single-axis tiles |
//!
//! # Example
//! ```
//! use graph_ir::GraphBuilder;
//! use graph_rewrite::{RewriteRule, WhereDecomposition};
//!
//! let mut graph = GraphBuilder::new("g")
//!     .data("x").shape(&[4, 5])
//!     .op("w", "Where")
//!     .data("idx")
//!     .chain(&["x", "w", "idx"])
//!     .build()
//!     .unwrap();
//! let report = WhereDecomposition.find_and_replace_pattern(&mut graph).unwrap();
//! assert_eq!(report.applied, 1);
//! assert!(graph.nodes_by_op("Where").is_empty());
//! ```

mod error;
mod matcher;
mod pattern;
mod rule;
pub mod rules;

pub use error::RewriteError;
pub use matcher::{find_matches, match_holds, Matches};
pub use pattern::{Match, NodeClass, NodeMatcher, NodePredicate, Pattern, PatternEdge};
pub use rule::{apply_rule, RewriteRule, RuleFailure, RuleReport};
pub use rules::{rule_by_name, TileToSeqTiles, WhereDecomposition, BUILTIN_RULES};
