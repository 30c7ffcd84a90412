//! errors.rs - Custom error types for the sqlshift-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//! Every variant carries enough context (field, path, line, pattern) to
//! diagnose a failure without re-running at a higher verbosity.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

/// This enum represents all possible error types in the `sqlshift-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ShiftError {
    /// A required policy or connection value is absent or invalid.
    #[error("Invalid configuration for '{field}': {reason}")]
    Config { field: String, reason: String },

    /// The dump to rewrite does not exist. Raised before any output is touched.
    #[error("Input dump not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A read or write failed while streaming the dump.
    #[error("I/O error on {}{}: {source}", .path.display(), line_suffix(.line))]
    Io {
        path: PathBuf,
        line: Option<u64>,
        #[source]
        source: std::io::Error,
    },

    /// A rule pattern failed to compile.
    #[error("Failed to compile rule '{rule}' with pattern '{pattern}': {source}")]
    PatternCompilation {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A policy file could not be parsed.
    #[error("Failed to parse policy file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

impl ShiftError {
    /// Shorthand for a [`ShiftError::Config`] naming the offending field.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ShiftError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, line: Option<u64>, source: std::io::Error) -> Self {
        ShiftError::Io {
            path: path.into(),
            line,
            source,
        }
    }
}

fn line_suffix(line: &Option<u64>) -> String {
    match line {
        Some(n) => format!(" (line {})", n),
        None => String::new(),
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ShiftError> = std::result::Result<T, E>;
