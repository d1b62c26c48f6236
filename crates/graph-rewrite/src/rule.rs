// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`RewriteRule`] trait and the atomic match-and-replace loop.

use crate::matcher::{find_matches, match_holds};
use crate::pattern::{Match, Pattern};
use crate::RewriteError;
use graph_ir::Graph;
use std::time::{Duration, Instant};

/// A structural rewrite: a declarative [`Pattern`] plus the replacement
/// applied to each occurrence.
///
/// Rules hold no graph state, so one instance can be applied to any
/// number of graphs.
///
/// ```ignore
/// struct DropIdentity;
/// impl RewriteRule for DropIdentity {
///     fn name(&self) -> &str { "DropIdentity" }
///     fn pattern(&self) -> Pattern { /* ... */ }
///     fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError> { /* ... */ }
/// }
/// ```
pub trait RewriteRule: Send + Sync {
    /// Stable rule name used in configs and reports.
    fn name(&self) -> &str;

    /// The subgraph this rule rewrites.
    fn pattern(&self) -> Pattern;

    /// Rewrites one occurrence.
    ///
    /// May leave the graph half-edited on error; [`apply_rule`] restores it.
    fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError>;

    /// Applies the rule to every occurrence, recording failures and
    /// continuing past them.
    fn find_and_replace_pattern(&self, graph: &mut Graph) -> Result<RuleReport, RewriteError> {
        apply_rule(self, graph, false)
    }
}

/// A replacement that failed and was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RuleFailure {
    /// Name of the anchor node of the failed match.
    pub node: String,
    pub message: String,
}

/// Statistics of one rule application.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RuleReport {
    pub rule: String,
    /// Occurrences found before any replacement.
    pub matches: usize,
    pub applied: usize,
    /// Occurrences invalidated by an earlier replacement in the same run.
    pub skipped: usize,
    pub failures: Vec<RuleFailure>,
    #[serde(serialize_with = "serialize_ms")]
    pub elapsed: Duration,
}

impl RuleReport {
    /// Returns `true` if the rule changed the graph.
    pub fn changed(&self) -> bool {
        self.applied > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} match(es), {} applied, {} skipped, {} failed",
            self.rule,
            self.matches,
            self.applied,
            self.skipped,
            self.failures.len()
        )
    }
}

fn serialize_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Finds every occurrence of `rule`'s pattern and replaces them one by one.
///
/// Matches are collected up front. Before each replacement the match is
/// re-checked against the current graph and skipped if it no longer holds.
/// Each replacement runs against a snapshot: on error the graph is
/// restored, so a failed replacement never leaves a partial edit.
///
/// With `fail_fast` the first failure is returned as
/// [`RewriteError::RewriteFailed`]; otherwise it is recorded in the report
/// and the remaining matches are still processed.
///
/// # Errors
/// [`RewriteError::InvalidPattern`] if the rule's pattern is malformed.
pub fn apply_rule<R: RewriteRule + ?Sized>(
    rule: &R,
    graph: &mut Graph,
    fail_fast: bool,
) -> Result<RuleReport, RewriteError> {
    let start = Instant::now();
    let pattern = rule.pattern();
    pattern.validate()?;

    let found: Vec<Match> = find_matches(graph, &pattern).collect();
    let mut report = RuleReport {
        rule: rule.name().to_string(),
        matches: found.len(),
        ..RuleReport::default()
    };

    for m in &found {
        if !match_holds(graph, &pattern, m) {
            tracing::debug!("{}: match no longer holds, skipping", rule.name());
            report.skipped += 1;
            continue;
        }
        let anchor = m
            .anchor()
            .and_then(|id| graph.node(id).ok().map(|n| n.name().to_string()))
            .unwrap_or_default();

        let snapshot = graph.clone();
        match rule.replace(graph, m) {
            Ok(()) => {
                tracing::debug!("{}: rewrote '{anchor}'", rule.name());
                report.applied += 1;
            }
            Err(e) => {
                *graph = snapshot;
                let failure = RewriteError::RewriteFailed {
                    rule: rule.name().to_string(),
                    node: anchor.clone(),
                    detail: e.to_string(),
                };
                if fail_fast {
                    return Err(failure);
                }
                tracing::warn!("{failure}");
                report.failures.push(RuleFailure {
                    node: anchor,
                    message: failure.to_string(),
                });
            }
        }
    }

    report.elapsed = start.elapsed();
    if report.matches > 0 {
        tracing::info!("{}", report.summary());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeMatcher;
    use graph_ir::{Attrs, GraphBuilder};

    /// Removes `Identity` ops, wiring their input straight to the consumers.
    struct DropIdentity;

    impl RewriteRule for DropIdentity {
        fn name(&self) -> &str {
            "DropIdentity"
        }

        fn pattern(&self) -> Pattern {
            Pattern::new()
                .node("id", NodeMatcher::op("Identity"))
                .node("in", NodeMatcher::data())
                .node("out", NodeMatcher::data())
                .edge_ports("in", "id", None, Some(0))
                .edge_ports("id", "out", Some(0), None)
        }

        fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError> {
            let (id, input, output) = (m.node("id")?, m.node("in")?, m.node("out")?);
            let consumers = graph.consumers_of(output)?;
            graph.remove_node(id, true)?;
            for (consumer, port) in consumers {
                graph.disconnect_input(consumer, port)?;
                graph.connect(input, 0, consumer, port)?;
            }
            graph.remove_node(output, true)?;
            Ok(())
        }
    }

    /// Adds a node, then fails.
    struct Broken;

    impl RewriteRule for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn pattern(&self) -> Pattern {
            Pattern::new().node("id", NodeMatcher::op("Identity"))
        }

        fn replace(&self, graph: &mut Graph, m: &Match) -> Result<(), RewriteError> {
            graph.add_operation_node("junk", "Junk", Attrs::new());
            let id = m.node("id")?;
            // Removing a connected node without cascade fails.
            graph.remove_node(id, false)?;
            Ok(())
        }
    }

    fn identity_chain() -> Graph {
        GraphBuilder::new("ids")
            .data("x")
            .op("id1", "Identity")
            .data("y")
            .op("id2", "Identity")
            .data("z")
            .op("out", "Result")
            .chain(&["x", "id1", "y", "id2", "z", "out"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_applies_every_match() {
        let mut g = identity_chain();
        let report = DropIdentity.find_and_replace_pattern(&mut g).unwrap();
        assert_eq!(report.matches, 2);
        // The second match's input node was removed by the first rewrite.
        assert_eq!(report.applied + report.skipped, 2);
        assert!(report.failures.is_empty());
        assert!(report.changed());
    }

    #[test]
    fn test_second_run_finds_nothing() {
        let mut g = identity_chain();
        while DropIdentity.find_and_replace_pattern(&mut g).unwrap().changed() {}
        assert!(g.nodes_by_op("Identity").is_empty());
        let out = g.node_by_name("out").unwrap();
        let x = g.node_by_name("x").unwrap();
        assert_eq!(g.inputs_of(out).unwrap(), vec![(0, x)]);
        assert_eq!(DropIdentity.find_and_replace_pattern(&mut g).unwrap().matches, 0);
    }

    #[test]
    fn test_failure_rolls_back() {
        let mut g = identity_chain();
        let before = g.node_count();
        let report = Broken.find_and_replace_pattern(&mut g).unwrap();
        assert_eq!(report.matches, 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].node, "id1");
        assert_eq!(g.node_count(), before);
        assert!(g.find_by_name("junk").is_none());
    }

    #[test]
    fn test_fail_fast_returns_rewrite_failed() {
        let mut g = identity_chain();
        let err = apply_rule(&Broken, &mut g, true).unwrap_err();
        assert!(matches!(err, RewriteError::RewriteFailed { ref rule, ref node, .. } if rule == "Broken" && node == "id1"));
        assert!(err.is_recoverable());
        assert!(g.find_by_name("junk").is_none());
    }
}
