// sqlshift-core/src/lib.rs
//! # sqlshift Core Library
//!
//! `sqlshift-core` holds the rewrite engine that makes a PostgreSQL dump taken
//! on one hosting platform replayable on another. The dump is treated as a
//! line-oriented text stream: each line is matched against an ordered table of
//! case-insensitive patterns derived from a [`RewritePolicy`], and is either
//! dropped (with an audit comment left in its place), rewritten, or passed
//! through untouched.
//!
//! The library performs no process invocation. The `sqlshift` binary wraps it
//! with `pg_dump`, `psql` and a command-line surface.
//!
//! ## Modules
//!
//! * `policy`: [`RewritePolicy`], its defaults and YAML loading.
//! * `rules`: [`Rule`], [`Action`] and [`RuleSet`], plus the compiler that
//!   derives them from a policy.
//! * `engine`: [`DumpRewriter`], the streaming line processor.
//! * `report`: [`RunReport`] and the [`RewriteReporter`] collaborator.
//! * `config`: environment-derived connection settings ([`MigrationConfig`]).
//! * `headless`: one-shot rewriting of an in-memory string.
//! * `errors`: the [`ShiftError`] type.
//!
//! ## Usage Example
//!
//! ```rust
//! use sqlshift_core::{headless_rewrite_string, RewritePolicy};
//!
//! let policy = RewritePolicy::default().with_target_schema("analytics");
//! let dump = "CREATE ROLE cloudsqlsuperuser;\nCREATE TABLE public.orders (id int);\n";
//! let (rewritten, report) = headless_rewrite_string(policy, dump).unwrap();
//!
//! assert!(rewritten.starts_with("-- SKIPPED LINE"));
//! assert!(rewritten.contains("CREATE TABLE \"analytics\".orders (id int);"));
//! assert_eq!(report.skipped, 1);
//! ```
//!
//! ## Known limitations
//!
//! Matching is per physical line. A statement split across lines, or a keyword
//! inside a string literal or dollar-quoted body at the start of a line, is
//! not handled reliably.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod config;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod policy;
pub mod report;
pub mod rules;

pub use config::{ConnectionSettings, MigrationConfig, Requirements, TargetSettings};
pub use engine::{DumpRewriter, LineOutcome};
pub use errors::ShiftError;
pub use headless::headless_rewrite_string;
pub use policy::{RewritePolicy, DEFAULT_ADMIN_ROLES, DEFAULT_TARGET_OWNER, DEFAULT_TARGET_SCHEMA};
pub use report::{LogReporter, NullReporter, RewriteReporter, RunReport};
pub use rules::compiler::compile_rule_set;
pub use rules::{Action, Rule, RuleSet};
