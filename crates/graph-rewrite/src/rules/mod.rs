// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Built-in rewrite rules.

pub mod tile_to_seq_tiles;
pub mod where_decomposition;

use crate::RewriteRule;

pub use tile_to_seq_tiles::TileToSeqTiles;
pub use where_decomposition::WhereDecomposition;

/// Names of the built-in rules, in their default application order.
pub const BUILTIN_RULES: &[&str] = &["WhereDecomposition", "TileToSeqTiles"];

/// Instantiates a built-in rule by name.
pub fn rule_by_name(name: &str) -> Option<Box<dyn RewriteRule>> {
    match name {
        "WhereDecomposition" => Some(Box::new(WhereDecomposition::new())),
        "TileToSeqTiles" => Some(Box::new(TileToSeqTiles::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_resolve() {
        for name in BUILTIN_RULES {
            let rule = rule_by_name(name).unwrap();
            assert_eq!(rule.name(), *name);
        }
        assert!(rule_by_name("Nope").is_none());
    }
}
