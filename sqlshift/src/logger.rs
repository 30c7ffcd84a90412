//! Logger setup for the sqlshift binary.
//!
//! Logging goes through the `log` facade and is rendered by `env_logger` on
//! stderr, so stdout stays free for machine-readable output such as
//! `clean --json`. `RUST_LOG` is honored unless a level is forced from the
//! command line.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Default filter when neither `RUST_LOG` nor a flag is given.
const DEFAULT_FILTER: &str = "warn";

/// Initializes the global logger. Safe to call more than once; later calls
/// are ignored, which keeps test harnesses that share a process happy.
pub fn init_logger(level_override: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.target(Target::Stderr).format_timestamp(None);

    if let Some(level) = level_override {
        builder.filter_level(level);
    }

    let _ = builder.try_init();
}

/// Maps the `--quiet` / `--debug` flags onto a forced level.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
