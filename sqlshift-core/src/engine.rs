// sqlshift-core/src/engine.rs
//! The line processor: streams a dump through a [`RuleSet`].
//!
//! Each input line is handled on its own. Skip rules are tried first and the
//! first hit replaces the whole line with an audit marker; otherwise every
//! rewrite rule is applied in order to the current text. Output line *i*
//! depends only on input line *i* and the immutable rule set, and at most one
//! line is held in memory at a time.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::{Result, ShiftError};
use crate::policy::RewritePolicy;
use crate::report::{RewriteReporter, RunReport};
use crate::rules::{Action, Rule, RuleSet};

/// Result of running one line through the rule tables.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome<'r> {
    /// No rule matched; the line is written as-is.
    Unchanged,
    /// A skip rule matched; `marker` replaces the line.
    Skipped { rule: &'r Rule, marker: String },
    /// One or more rewrite rules matched.
    Rewritten {
        text: String,
        substitutions: u64,
        /// Substitutions per rule, in rule order.
        hits: Vec<(&'static str, u64)>,
    },
}

/// Builds the audit comment written in place of a skipped line.
pub fn skip_marker(rule: &Rule, line: &str) -> String {
    format!("-- SKIPPED LINE (by pattern {}): {}", rule.pattern(), line.trim())
}

/// Splits a line read with `read_line` into its content and terminator.
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Rewrites dumps according to one [`RewritePolicy`].
///
/// The rewriter is immutable once built and can be shared across threads;
/// each call to [`rewrite_stream`](Self::rewrite_stream) or
/// [`rewrite_file`](Self::rewrite_file) gets its own [`RunReport`].
#[derive(Debug, Clone)]
pub struct DumpRewriter {
    policy: RewritePolicy,
    rules: RuleSet,
}

impl DumpRewriter {
    pub fn new(policy: RewritePolicy) -> Result<Self> {
        let rules = RuleSet::from_policy(&policy)?;
        Ok(Self { policy, rules })
    }

    pub fn policy(&self) -> &RewritePolicy {
        &self.policy
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Runs a single line (without its terminator) through the rule tables.
    pub fn rewrite_line(&self, line: &str) -> LineOutcome<'_> {
        if let Some(rule) = self.rules.skip_rules.iter().find(|r| r.regex.is_match(line)) {
            return LineOutcome::Skipped {
                rule,
                marker: skip_marker(rule, line),
            };
        }

        let mut current = Cow::Borrowed(line);
        let mut substitutions = 0u64;
        let mut hits = Vec::new();
        for rule in &self.rules.rewrite_rules {
            let Action::Rewrite(template) = &rule.action else {
                continue;
            };
            let count = rule.regex.find_iter(&current).count() as u64;
            if count == 0 {
                continue;
            }
            let replaced = rule.regex.replace_all(&current, template.as_str()).into_owned();
            current = Cow::Owned(replaced);
            substitutions += count;
            hits.push((rule.name, count));
        }

        if substitutions == 0 {
            LineOutcome::Unchanged
        } else {
            LineOutcome::Rewritten {
                text: current.into_owned(),
                substitutions,
                hits,
            }
        }
    }

    /// Rewrites `reader` into `writer` line by line.
    pub fn rewrite_stream<R: BufRead, W: Write>(
        &self,
        reader: R,
        writer: W,
        reporter: &mut dyn RewriteReporter,
    ) -> Result<RunReport> {
        self.process(reader, writer, Path::new("<input>"), Path::new("<output>"), reporter)
    }

    /// Rewrites the dump at `input` into a new file at `output`.
    ///
    /// Fails with [`ShiftError::InputNotFound`] before anything is created when
    /// `input` is missing. The parent directory of `output` is created when
    /// absent. A failure mid-stream leaves a partial output file behind.
    pub fn rewrite_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        reporter: &mut dyn RewriteReporter,
    ) -> Result<RunReport> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.exists() {
            return Err(ShiftError::InputNotFound(input.to_path_buf()));
        }
        if input == output || same_file(input, output) {
            return Err(ShiftError::config(
                "output",
                format!("{} would overwrite the input dump", output.display()),
            ));
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                debug!("Creating output directory {}", parent.display());
                fs::create_dir_all(parent).map_err(|e| ShiftError::io(parent, None, e))?;
            }
        }

        let reader = File::open(input)
            .map(BufReader::new)
            .map_err(|e| ShiftError::io(input, None, e))?;
        let writer = File::create(output)
            .map(BufWriter::new)
            .map_err(|e| ShiftError::io(output, None, e))?;

        info!("Rewriting dump {} -> {}", input.display(), output.display());
        self.process(reader, writer, input, output, reporter)
    }

    fn process<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        input: &Path,
        output: &Path,
        reporter: &mut dyn RewriteReporter,
    ) -> Result<RunReport> {
        let mut report = RunReport::new();
        let mut buf = String::new();
        let mut line_number = 0u64;

        loop {
            buf.clear();
            let read = reader
                .read_line(&mut buf)
                .map_err(|e| ShiftError::io(input, Some(line_number + 1), e))?;
            if read == 0 {
                break;
            }
            line_number += 1;
            report.processed += 1;

            let (content, terminator) = split_terminator(&buf);
            let written = match self.rewrite_line(content) {
                LineOutcome::Unchanged => writer.write_all(buf.as_bytes()),
                LineOutcome::Skipped { rule, marker } => {
                    report.skipped += 1;
                    report.record_hit(rule.name, 1);
                    reporter.line_skipped(line_number, rule, content);
                    writer
                        .write_all(marker.as_bytes())
                        .and_then(|_| writer.write_all(terminator.as_bytes()))
                }
                LineOutcome::Rewritten {
                    text,
                    substitutions,
                    hits,
                } => {
                    report.modified += substitutions;
                    if text != content {
                        report.rewritten += 1;
                    }
                    for (name, count) in hits {
                        report.record_hit(name, count);
                    }
                    reporter.line_rewritten(line_number, substitutions, &text);
                    writer
                        .write_all(text.as_bytes())
                        .and_then(|_| writer.write_all(terminator.as_bytes()))
                }
            };
            written.map_err(|e| ShiftError::io(output, Some(line_number), e))?;
        }

        writer.flush().map_err(|e| ShiftError::io(output, None, e))?;
        reporter.finished(&report);
        Ok(report)
    }
}
