//! `import`: replay a cleaned dump on the destination with `psql`.

use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;

use sqlshift_core::{MigrationConfig, TargetSettings};

use crate::cli::ImportArgs;
use crate::ui::output_format::Console;
use crate::utils::process::ExternalCommand;

/// Builds the `psql` invocation. The whole file runs in one transaction and
/// the first error aborts it, so a failed import leaves the destination
/// untouched.
pub fn build_command(target: &TargetSettings, password: &str, psql_bin: &Path, dump: &Path) -> ExternalCommand {
    let conn = &target.connection;
    ExternalCommand::new(psql_bin)
        .arg("-h")
        .arg(&conn.host)
        .arg("-p")
        .arg(conn.port.to_string())
        .arg("-U")
        .arg(&conn.user)
        .arg("-d")
        .arg(&conn.database)
        .args(["--no-psqlrc", "--single-transaction", "-v", "ON_ERROR_STOP=1", "-f"])
        .arg(dump)
        .env("PGPASSWORD", password)
        .env("PGSSLMODE", &target.sslmode)
}

/// Replays `dump` on the configured destination.
pub fn replay(config: &MigrationConfig, psql_bin: &Path, dump: &Path, console: &Console) -> Result<()> {
    let target = config
        .target
        .as_ref()
        .context("Destination connection settings are not configured")?;
    if !dump.is_file() {
        bail!("Cleaned dump not found: {}", dump.display());
    }
    let password = target
        .connection
        .password
        .as_deref()
        .context("Destination password is not configured")?;

    console.info(format!(
        "Importing {} into {} on {}:{}",
        dump.display(),
        target.connection.database,
        target.connection.host,
        target.connection.port
    ));
    build_command(target, password, psql_bin, dump)
        .run()
        .context("Import with psql failed; the transaction was rolled back")?;

    info!("Import finished for {}", dump.display());
    console.success(format!("Imported {} into {}", dump.display(), target.connection.database));
    Ok(())
}

/// Runs the `import` command.
pub fn run(config: &MigrationConfig, args: &ImportArgs, console: &Console) -> Result<()> {
    let dump = args.input.clone().unwrap_or_else(|| config.cleaned_dump.clone());
    replay(config, &args.psql_bin, &dump, console)
}
