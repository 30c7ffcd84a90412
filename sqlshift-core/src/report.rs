//! Run reporting for the rewrite engine.
//!
//! [`RunReport`] holds the counters for one pass over a dump. The engine does
//! not log per-line events itself: it notifies a [`RewriteReporter`] passed in
//! by the caller, so the binary can forward events to the `log` facade while
//! tests capture them deterministically.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rules::Rule;

/// Counters accumulated during a single rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Lines read from the input.
    pub processed: u64,
    /// Lines replaced by a skip marker.
    pub skipped: u64,
    /// Substitution instances applied by rewrite rules.
    pub modified: u64,
    /// Lines whose text differs from the input after rewriting.
    pub rewritten: u64,
    /// Hits per rule name. Skip rules count lines; rewrite rules count substitutions.
    pub rule_hits: BTreeMap<String, u64>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&mut self, rule: &str, count: u64) {
        *self.rule_hits.entry(rule.to_string()).or_insert(0) += count;
    }

    /// Lines copied to the output unchanged.
    pub fn passed_through(&self) -> u64 {
        self.processed - self.skipped - self.rewritten
    }
}

/// Receives engine events as a dump is rewritten.
pub trait RewriteReporter {
    /// A line matched `rule` and was replaced by a skip marker.
    fn line_skipped(&mut self, line_number: u64, rule: &Rule, original: &str) {
        let _ = (line_number, rule, original);
    }

    /// A line was rewritten with `substitutions` replacements in total.
    fn line_rewritten(&mut self, line_number: u64, substitutions: u64, rewritten: &str) {
        let _ = (line_number, substitutions, rewritten);
    }

    /// The pass finished and `report` is final.
    fn finished(&mut self, report: &RunReport) {
        let _ = report;
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl RewriteReporter for NullReporter {}

/// Forwards events to the `log` facade: per-line events at debug level, the
/// run summary at info level.
#[derive(Debug, Default, Clone)]
pub struct LogReporter {
    source_id: String,
}

impl LogReporter {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
        }
    }
}

impl RewriteReporter for LogReporter {
    fn line_skipped(&mut self, line_number: u64, rule: &Rule, original: &str) {
        debug!(
            target: "sqlshift_core::engine",
            "{}:{}: skipped by rule '{}': {}",
            self.source_id,
            line_number,
            rule.name,
            original.trim()
        );
    }

    fn line_rewritten(&mut self, line_number: u64, substitutions: u64, _rewritten: &str) {
        debug!(
            target: "sqlshift_core::engine",
            "{}:{}: {} substitution(s) applied",
            self.source_id, line_number, substitutions
        );
    }

    fn finished(&mut self, report: &RunReport) {
        info!(
            "Rewrite of {} complete: {} lines processed, {} skipped, {} substitutions.",
            self.source_id, report.processed, report.skipped, report.modified
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_through() {
        let report = RunReport {
            processed: 10,
            skipped: 2,
            modified: 5,
            rewritten: 3,
            rule_hits: BTreeMap::new(),
        };
        assert_eq!(report.passed_through(), 5);
    }

    #[test]
    fn test_record_hit_accumulates() {
        let mut report = RunReport::new();
        report.record_hit("owner_to", 1);
        report.record_hit("owner_to", 2);
        assert_eq!(report.rule_hits.get("owner_to"), Some(&3));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut report = RunReport::new();
        report.processed = 1;
        report.record_hit("create_alter_role", 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["processed"], 1);
        assert_eq!(json["rule_hits"]["create_alter_role"], 1);
    }
}
