// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Converter configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! rules = ["WhereDecomposition", "TileToSeqTiles"]
//! abort_on_error = false
//! infer_before_rules = true
//! infer_after_each_rule = true
//! check_unique_names = true
//! ```

use crate::ConvertError;
use graph_rewrite::{rule_by_name, RewriteRule, BUILTIN_RULES};
use std::path::Path;

/// Configuration for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConverterConfig {
    /// Rewrite rules to apply, in order.
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,
    /// Escalate the first recoverable failure into an error.
    #[serde(default)]
    pub abort_on_error: bool,
    /// Run shape inference once before any rule.
    #[serde(default = "default_true")]
    pub infer_before_rules: bool,
    /// Re-infer stale nodes after every rule that changed the graph.
    /// When off, inference runs once after the last rule.
    #[serde(default = "default_true")]
    pub infer_after_each_rule: bool,
    /// Reject graphs in which two nodes share a name.
    #[serde(default = "default_true")]
    pub check_unique_names: bool,
}

fn default_true() -> bool {
    true
}

fn default_rules() -> Vec<String> {
    BUILTIN_RULES.iter().map(|r| r.to_string()).collect()
}

impl ConverterConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConvertError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConvertError> {
        toml::from_str(toml_str)
            .map_err(|e| ConvertError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConvertError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConvertError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Instantiates the configured rules, in order.
    pub fn create_rules(&self) -> Result<Vec<Box<dyn RewriteRule>>, ConvertError> {
        self.rules
            .iter()
            .map(|name| {
                rule_by_name(name).ok_or_else(|| {
                    ConvertError::ConfigError(format!(
                        "unknown rule '{name}'; expected one of {}",
                        BUILTIN_RULES.join(", ")
                    ))
                })
            })
            .collect()
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            abort_on_error: false,
            infer_before_rules: true,
            infer_after_each_rule: true,
            check_unique_names: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = ConverterConfig::default();
        assert_eq!(c.rules, vec!["WhereDecomposition", "TileToSeqTiles"]);
        assert!(!c.abort_on_error);
        assert!(c.infer_after_each_rule);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
rules = ["TileToSeqTiles"]
abort_on_error = true
infer_after_each_rule = false
"#;
        let c = ConverterConfig::from_toml(toml).unwrap();
        assert_eq!(c.rules, vec!["TileToSeqTiles"]);
        assert!(c.abort_on_error);
        assert!(!c.infer_after_each_rule);
        assert!(c.infer_before_rules);
        assert!(c.check_unique_names);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ConverterConfig::from_toml("").unwrap(), ConverterConfig::default());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = ConverterConfig {
            rules: vec!["WhereDecomposition".into()],
            abort_on_error: true,
            ..Default::default()
        };
        let back = ConverterConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_create_rules_in_order() {
        let c = ConverterConfig {
            rules: vec!["TileToSeqTiles".into(), "WhereDecomposition".into()],
            ..Default::default()
        };
        let names: Vec<String> = c.create_rules().unwrap().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["TileToSeqTiles", "WhereDecomposition"]);
    }

    #[test]
    fn test_create_rules_unknown() {
        let c = ConverterConfig {
            rules: vec!["bogus".into()],
            ..Default::default()
        };
        assert!(matches!(c.create_rules(), Err(ConvertError::ConfigError(_))));
    }

    #[test]
    fn test_bad_toml() {
        assert!(ConverterConfig::from_toml("rules = 3").is_err());
    }
}
