// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Conversion statistics.
//!
//! [`ConversionReport`] collects per-rule statistics, shape inference
//! statistics and every recoverable failure of a run, so a caller sees all
//! problems at once instead of only the first.

use graph_rewrite::RuleReport;
use shape_infer::InferReport;
use std::fmt;
use std::time::Duration;

/// Which part of the conversion produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Rewrite,
    Inference,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Rewrite => write!(f, "rewrite"),
            Stage::Inference => write!(f, "inference"),
        }
    }
}

/// A recoverable failure recorded during conversion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PassFailure {
    pub stage: Stage,
    /// Rule name for rewrite failures, op kind for inference failures.
    pub source: String,
    pub node: String,
    pub kind: String,
    pub message: String,
}

impl fmt::Display for PassFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure in '{}' ({}): {}", self.stage, self.node, self.source, self.message)
    }
}

/// Aggregate shape inference statistics over all inference runs.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InferenceStats {
    pub runs: usize,
    pub nodes_inferred: usize,
    pub nodes_skipped: usize,
    #[serde(serialize_with = "serialize_ms")]
    pub duration: Duration,
}

/// Everything that happened during one conversion.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ConversionReport {
    pub graph_name: String,
    /// One entry per applied rule, in application order.
    pub rules: Vec<RuleReport>,
    pub inference: InferenceStats,
    /// Every rewrite failure, plus the inference failures of the latest
    /// inference run. A node that fails to infer stays stale and is retried
    /// by each run, so the latest run holds the current set.
    pub failures: Vec<PassFailure>,
    #[serde(serialize_with = "serialize_ms")]
    pub total_duration: Duration,
}

fn serialize_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

impl ConversionReport {
    pub fn new(graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total rewrites applied across all rules.
    pub fn total_rewrites(&self) -> usize {
        self.rules.iter().map(|r| r.applied).sum()
    }

    /// Records a rule run and converts its failures.
    pub(crate) fn record_rule(&mut self, report: RuleReport) -> Vec<PassFailure> {
        let failures: Vec<PassFailure> = report
            .failures
            .iter()
            .map(|f| PassFailure {
                stage: Stage::Rewrite,
                source: report.rule.clone(),
                node: f.node.clone(),
                kind: "RewriteFailed".to_string(),
                message: f.message.clone(),
            })
            .collect();
        self.failures.extend(failures.iter().cloned());
        self.rules.push(report);
        failures
    }

    /// Records an inference run and converts its failures, replacing the
    /// inference failures of earlier runs.
    pub(crate) fn record_inference(&mut self, report: InferReport) -> Vec<PassFailure> {
        self.inference.runs += 1;
        self.inference.nodes_inferred += report.inferred;
        self.inference.nodes_skipped += report.skipped.len();
        self.inference.duration += report.elapsed;

        let failures: Vec<PassFailure> = report
            .failures
            .into_iter()
            .map(|f| PassFailure {
                stage: Stage::Inference,
                source: f.op,
                node: f.node,
                kind: f.kind,
                message: f.message,
            })
            .collect();
        self.failures.retain(|f| f.stage != Stage::Inference);
        self.failures.extend(failures.iter().cloned());
        failures
    }

    /// Renders the report as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "Conversion of '{}': {} rule(s), {} rewrite(s), {} inference run(s) \
             ({} node(s) inferred), {} failure(s), {:.2} ms\n",
            self.graph_name,
            self.rules.len(),
            self.total_rewrites(),
            self.inference.runs,
            self.inference.nodes_inferred,
            self.failures.len(),
            self.total_duration.as_secs_f64() * 1000.0,
        );
        for rule in &self.rules {
            s.push_str(&format!("  {}\n", rule.summary()));
        }
        for failure in &self.failures {
            s.push_str(&format!("  ! {failure}\n"));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_rewrite::RuleFailure;
    use shape_infer::InferFailure;

    #[test]
    fn test_record_rule_and_inference() {
        let mut report = ConversionReport::new("g");
        let rule = RuleReport {
            rule: "R".into(),
            matches: 3,
            applied: 2,
            failures: vec![RuleFailure {
                node: "n1".into(),
                message: "boom".into(),
            }],
            ..RuleReport::default()
        };
        let rewrite_failures = report.record_rule(rule);
        assert_eq!(rewrite_failures.len(), 1);
        assert_eq!(rewrite_failures[0].stage, Stage::Rewrite);
        assert_eq!(rewrite_failures[0].source, "R");

        let infer = InferReport {
            inferred: 4,
            failures: vec![InferFailure {
                node: "mm".into(),
                op: "MatMul".into(),
                kind: "ShapeInference".into(),
                message: "bad".into(),
            }],
            skipped: vec!["relu".into()],
            ..InferReport::default()
        };
        report.record_inference(infer);

        assert_eq!(report.total_rewrites(), 2);
        assert_eq!(report.inference.nodes_inferred, 4);
        assert_eq!(report.inference.nodes_skipped, 1);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_clean());
        assert!(report.summary().contains("inference failure in 'mm' (MatMul): bad"));
    }

    fn failing_run() -> InferReport {
        InferReport {
            failures: vec![InferFailure {
                node: "mm".into(),
                op: "MatMul".into(),
                kind: "ShapeInference".into(),
                message: "bad".into(),
            }],
            ..InferReport::default()
        }
    }

    #[test]
    fn test_repeated_inference_failure_recorded_once() {
        let mut report = ConversionReport::new("g");
        report.record_inference(failing_run());
        report.record_inference(failing_run());
        report.record_inference(failing_run());
        assert_eq!(report.inference.runs, 3);
        assert_eq!(report.failures.len(), 1);

        // A later clean run clears it; rewrite failures stay.
        report.record_rule(RuleReport {
            rule: "R".into(),
            failures: vec![RuleFailure {
                node: "n".into(),
                message: "boom".into(),
            }],
            ..RuleReport::default()
        });
        report.record_inference(InferReport::default());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::Rewrite);
    }

    #[test]
    fn test_json_output() {
        let report = ConversionReport::new("g");
        let json = report.to_json().unwrap();
        assert!(json.contains("\"graph_name\": \"g\""));
        assert!(json.contains("\"total_duration\""));
    }
}
