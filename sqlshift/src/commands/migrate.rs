//! `migrate`: export, clean and import in one run.
//!
//! Each step only starts when the previous one succeeded, so a failed
//! rewrite never reaches the destination.

use anyhow::{Context, Result};
use log::info;

use sqlshift_core::MigrationConfig;

use crate::cli::MigrateCommand;
use crate::commands::{clean, export, import, resolve_policy};
use crate::ui::output_format::Console;

pub fn run(config: &MigrationConfig, cmd: &MigrateCommand, console: &Console) -> Result<()> {
    // Policy and rule problems surface before pg_dump runs.
    let policy = resolve_policy(&cmd.policy, &config.policy)?;
    let rewriter = clean::build_rewriter(policy)?;
    let cleaned = cmd.cleaned.clone().unwrap_or_else(|| config.cleaned_dump.clone());

    let dump = export::run(config, &cmd.export, console).context("Step 1/3 (export) failed")?;
    clean::rewrite(&rewriter, &dump, &cleaned, &cmd.report, console).context("Step 2/3 (clean) failed")?;
    import::replay(config, &cmd.psql_bin, &cleaned, console).context("Step 3/3 (import) failed")?;

    info!("Migration finished");
    console.success("Migration complete");
    Ok(())
}
