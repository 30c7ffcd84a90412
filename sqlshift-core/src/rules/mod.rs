//! Rule tables for the dump rewrite engine.
//!
//! A [`RuleSet`] is two ordered lists of compiled [`Rule`]s derived from a
//! [`RewritePolicy`](crate::policy::RewritePolicy):
//!
//! * `skip_rules` are tested first and the first match wins. The line is
//!   dropped and an audit marker is written in its place.
//! * `rewrite_rules` are applied top to bottom on whatever the previous rule
//!   produced, so several rules can fire on one line.
//!
//! The tables are data, not control flow: the line processor in
//! [`engine`](crate::engine) never branches on policy values.
//!
//! License: MIT OR Apache-2.0

pub mod compiler;

use regex::Regex;
use sha2::{Digest, Sha256};

/// What a rule does to a line it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Drop the line and emit an audit comment instead.
    Skip,
    /// Replace every match with this template. `$name` references expand to
    /// capture groups; policy values embedded in it are already escaped.
    Rewrite(String),
}

/// A single compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier used in reports (e.g. `owner_to`).
    pub name: &'static str,
    /// The compiled, case-insensitive pattern.
    pub regex: Regex,
    pub action: Action,
}

impl Rule {
    /// The pattern source this rule was compiled from.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.pattern() == other.pattern() && self.action == other.action
    }
}

/// The ordered skip and rewrite tables for one policy.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) skip_rules: Vec<Rule>,
    pub(crate) rewrite_rules: Vec<Rule>,
}

impl RuleSet {
    pub fn skip_rules(&self) -> &[Rule] {
        &self.skip_rules
    }

    pub fn rewrite_rules(&self) -> &[Rule] {
        &self.rewrite_rules
    }

    pub fn len(&self) -> usize {
        self.skip_rules.len() + self.rewrite_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a rule by name in either table.
    pub fn find(&self, name: &str) -> Option<&Rule> {
        self.skip_rules
            .iter()
            .chain(self.rewrite_rules.iter())
            .find(|r| r.name == name)
    }

    /// SHA-256 over every rule's name, pattern and action, in table order.
    ///
    /// Two rule sets built from equal policies always share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (table, rules) in [("skip", &self.skip_rules), ("rewrite", &self.rewrite_rules)] {
            for rule in rules.iter() {
                hasher.update(table.as_bytes());
                hasher.update([0u8]);
                hasher.update(rule.name.as_bytes());
                hasher.update([0u8]);
                hasher.update(rule.pattern().as_bytes());
                hasher.update([0u8]);
                if let Action::Rewrite(template) = &rule.action {
                    hasher.update(template.as_bytes());
                }
                hasher.update(b"\n");
            }
        }
        hex::encode(hasher.finalize())
    }
}
