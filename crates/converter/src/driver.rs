// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The conversion driver with a type-state pipeline.
//!
//! ```text
//! Converter<Idle>
//!     │  .load(graph)
//!     ▼
//! Converter<Loaded>
//!     │  .run()
//!     ▼
//!  ConversionOutput
//! ```
//!
//! Rules run strictly in the configured order. Structural errors end the
//! run; recoverable ones are recorded in the report unless
//! `abort_on_error` is set.

use crate::report::ConversionReport;
use crate::{ConvertError, ConverterConfig, PassFailure};
use graph_ir::{Graph, GraphDescription};
use graph_rewrite::{apply_rule, RewriteRule};
use shape_infer::{infer_graph, InferenceRegistry};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// ── Abort handle ───────────────────────────────────────────────

/// Requests that a running conversion stop.
///
/// The driver checks the flag between rule applications, never during
/// one, so an aborted graph is always in a consistent state.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ── Type-state markers ─────────────────────────────────────────

/// No graph attached yet.
#[derive(Debug)]
pub struct Idle;

/// A graph is attached and ready to convert.
#[derive(Debug)]
pub struct Loaded {
    graph: Graph,
}

/// Sealed trait for converter states.
pub trait ConverterState: std::fmt::Debug {}
impl ConverterState for Idle {}
impl ConverterState for Loaded {}

// ── Output ─────────────────────────────────────────────────────

/// The converted graph and everything that happened to it.
#[derive(Debug)]
pub struct ConversionOutput {
    pub graph: Graph,
    pub report: ConversionReport,
}

// ── Converter ──────────────────────────────────────────────────

/// Applies ordered rewrite rules and shape inference to a graph.
///
/// # Example
/// ```
/// use converter::{Converter, ConverterConfig};
/// use graph_ir::GraphBuilder;
///
/// let graph = GraphBuilder::new("g")
///     .op("x", "Parameter").attr("shape", vec![4i64, 5])
///     .data("x_data")
///     .op("w", "Where")
///     .data("idx")
///     .op("out", "Result")
///     .chain(&["x", "x_data", "w", "idx", "out"])
///     .build()
///     .unwrap();
/// let output = Converter::new(ConverterConfig::default())
///     .unwrap()
///     .load(graph)
///     .run()
///     .unwrap();
/// assert!(output.report.is_clean());
/// assert!(output.graph.nodes_by_op("Where").is_empty());
/// ```
pub struct Converter<S: ConverterState = Idle> {
    config: ConverterConfig,
    registry: InferenceRegistry,
    rules: Vec<Box<dyn RewriteRule>>,
    abort: AbortHandle,
    state: S,
}

// ── Idle → Loaded ──────────────────────────────────────────────

impl Converter<Idle> {
    /// Creates a converter with the configured rules and the default
    /// operation catalogue.
    pub fn new(config: ConverterConfig) -> Result<Self, ConvertError> {
        let rules = config.create_rules()?;
        tracing::info!(
            "converter created with {} rule(s): [{}]",
            rules.len(),
            config.rules.join(", ")
        );
        Ok(Self {
            config,
            registry: InferenceRegistry::with_default_ops(),
            rules,
            abort: AbortHandle::new(),
            state: Idle,
        })
    }

    /// Replaces the configured rules, e.g. with custom ones.
    pub fn with_rules(mut self, rules: Vec<Box<dyn RewriteRule>>) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the inference registry.
    pub fn with_registry(mut self, registry: InferenceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Attaches the graph to convert.
    pub fn load(self, graph: Graph) -> Converter<Loaded> {
        tracing::info!("{}", graph.summary());
        Converter {
            config: self.config,
            registry: self.registry,
            rules: self.rules,
            abort: self.abort,
            state: Loaded { graph },
        }
    }

    /// Builds the graph from a description and attaches it.
    pub fn load_description(self, description: &GraphDescription) -> Result<Converter<Loaded>, ConvertError> {
        Ok(self.load(description.build()?))
    }
}

impl<S: ConverterState> Converter<S> {
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// A handle that can stop the run between rules.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Names of the rules that will run, in order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

// ── Loaded → output ────────────────────────────────────────────

impl Converter<Loaded> {
    pub fn graph(&self) -> &Graph {
        &self.state.graph
    }

    /// Runs the conversion.
    ///
    /// Steps:
    /// 1. Check unique names (if configured) and structural validity.
    /// 2. Infer shapes (if `infer_before_rules`).
    /// 3. Apply each rule in order, re-inferring after rules that changed
    ///    the graph (if `infer_after_each_rule`).
    /// 4. Infer whatever is still stale and validate the result.
    pub fn run(self) -> Result<ConversionOutput, ConvertError> {
        let start = Instant::now();
        let Converter {
            config,
            registry,
            rules,
            abort,
            state: Loaded { mut graph },
        } = self;
        let mut report = ConversionReport::new(graph.name());

        if config.check_unique_names {
            check_unique_names(&graph)?;
        }
        graph.validate()?;

        if config.infer_before_rules {
            infer_stage(&mut graph, &registry, &config, &mut report)?;
        }

        for (completed, rule) in rules.iter().enumerate() {
            if abort.is_aborted() {
                tracing::warn!("abort requested; stopping before rule '{}'", rule.name());
                return Err(ConvertError::Aborted {
                    completed,
                    total: rules.len(),
                });
            }
            let rule_report = apply_rule(rule.as_ref(), &mut graph, config.abort_on_error)?;
            let changed = rule_report.changed();
            let failures = report.record_rule(rule_report);
            escalate(&config, failures)?;

            if changed && config.infer_after_each_rule {
                infer_stage(&mut graph, &registry, &config, &mut report)?;
            }
        }

        if !graph.stale_nodes().is_empty() {
            infer_stage(&mut graph, &registry, &config, &mut report)?;
        }
        graph.validate()?;

        report.total_duration = start.elapsed();
        tracing::info!(
            "conversion of '{}' finished: {} rewrite(s), {} failure(s) in {:.2} ms",
            report.graph_name,
            report.total_rewrites(),
            report.failures.len(),
            report.total_duration.as_secs_f64() * 1000.0,
        );
        Ok(ConversionOutput { graph, report })
    }
}

/// Converts a graph with the given configuration in one call.
pub fn convert(graph: Graph, config: ConverterConfig) -> Result<ConversionOutput, ConvertError> {
    Converter::new(config)?.load(graph).run()
}

fn infer_stage(
    graph: &mut Graph,
    registry: &InferenceRegistry,
    config: &ConverterConfig,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    let infer_report = infer_graph(graph, registry)?;
    let failures = report.record_inference(infer_report);
    escalate(config, failures)
}

/// With `abort_on_error`, turns the first recorded failure into an error.
fn escalate(config: &ConverterConfig, failures: Vec<PassFailure>) -> Result<(), ConvertError> {
    match failures.into_iter().next() {
        Some(first) if config.abort_on_error => Err(ConvertError::PassFailed(first)),
        _ => Ok(()),
    }
}

fn check_unique_names(graph: &Graph) -> Result<(), ConvertError> {
    let mut seen = HashSet::new();
    for node in graph.nodes() {
        if !seen.insert(node.name()) {
            return Err(ConvertError::DuplicateName(node.name().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_ir::GraphBuilder;

    fn where_graph() -> Graph {
        GraphBuilder::new("g")
            .op("x", "Parameter").attr("shape", vec![2i64, 3])
            .data("x_data")
            .op("w", "Where")
            .data("idx")
            .op("out", "Result")
            .chain(&["x", "x_data", "w", "idx", "out"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_abort_handle() {
        let h = AbortHandle::new();
        let clone = h.clone();
        assert!(!h.is_aborted());
        clone.abort();
        assert!(h.is_aborted());
    }

    #[test]
    fn test_abort_before_first_rule() {
        let converter = Converter::new(ConverterConfig::default()).unwrap();
        converter.abort_handle().abort();
        let err = converter.load(where_graph()).run().unwrap_err();
        assert!(matches!(err, ConvertError::Aborted { completed: 0, total: 2 }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut g = where_graph();
        let w = g.node_by_name("w").unwrap();
        g.rename(w, "x").unwrap();
        let err = convert(g, ConverterConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateName(ref n) if n == "x"));
    }

    #[test]
    fn test_rule_order_is_kept() {
        let config = ConverterConfig {
            rules: vec!["TileToSeqTiles".into(), "WhereDecomposition".into()],
            ..Default::default()
        };
        let output = Converter::new(config).unwrap().load(where_graph()).run().unwrap();
        let names: Vec<&str> = output.report.rules.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(names, vec!["TileToSeqTiles", "WhereDecomposition"]);
    }

    #[test]
    fn test_no_inference_until_the_end() {
        let config = ConverterConfig {
            infer_before_rules: false,
            infer_after_each_rule: false,
            ..Default::default()
        };
        let output = convert(where_graph(), config).unwrap();
        assert_eq!(output.report.inference.runs, 1);
        assert!(output.graph.stale_nodes().is_empty());
    }
}
