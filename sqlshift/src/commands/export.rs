//! `export`: dump the source database with `pg_dump`.

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use sqlshift_core::{ConnectionSettings, MigrationConfig};

use crate::cli::ExportArgs;
use crate::ui::output_format::Console;
use crate::utils::process::ExternalCommand;

/// Builds the `pg_dump` invocation. Ownership, privileges, ACLs and comments
/// are suppressed at the source so the rewrite has less to undo.
pub fn build_command(
    source: &ConnectionSettings,
    password: &str,
    args: &ExportArgs,
    dump: &Path,
) -> ExternalCommand {
    let mut cmd = ExternalCommand::new(&args.pg_dump_bin)
        .arg("-h")
        .arg(&source.host)
        .arg("-p")
        .arg(source.port.to_string())
        .arg("-U")
        .arg(&source.user)
        .arg("-d")
        .arg(&source.database)
        .args(["--no-owner", "--no-privileges", "--no-comments", "--no-acl"]);
    if args.data_only {
        cmd = cmd.arg("--data-only");
    }
    if args.column_inserts {
        cmd = cmd.arg("--column-inserts");
    }
    cmd.arg("--file").arg(dump).env("PGPASSWORD", password)
}

/// Runs the export and returns the path of the written dump.
pub fn run(config: &MigrationConfig, args: &ExportArgs, console: &Console) -> Result<PathBuf> {
    let source = config
        .source
        .as_ref()
        .context("Source connection settings are not configured")?;
    let dump = args.dump.clone().unwrap_or_else(|| config.output_dump.clone());

    let password = match &source.password {
        Some(p) => p.clone(),
        None => rpassword::prompt_password(format!(
            "Enter password for {}@{}: ",
            source.user, source.host
        ))
        .context("Failed to read the source database password")?,
    };

    if let Some(parent) = dump.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    console.info(format!(
        "Exporting {} from {}:{} to {}",
        source.database,
        source.host,
        source.port,
        dump.display()
    ));
    build_command(source, &password, args, &dump)
        .run()
        .context("Export with pg_dump failed")?;

    if !dump.is_file() {
        console.warn(format!(
            "{} finished but {} was not written",
            args.pg_dump_bin.display(),
            dump.display()
        ));
    }
    info!("Export finished: {}", dump.display());
    console.success(format!("Dump written to {}", dump.display()));
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ConnectionSettings {
        ConnectionSettings {
            host: "10.0.0.5".to_string(),
            port: 5432,
            user: "exporter".to_string(),
            database: "shop".to_string(),
            password: None,
        }
    }

    fn args() -> ExportArgs {
        ExportArgs {
            dump: None,
            data_only: false,
            column_inserts: false,
            pg_dump_bin: PathBuf::from("pg_dump"),
        }
    }

    #[test]
    fn test_command_line() {
        let cmd = build_command(&source(), "pw", &args(), &PathBuf::from("backup.sql"));
        assert_eq!(
            cmd.display(),
            "pg_dump -h 10.0.0.5 -p 5432 -U exporter -d shop --no-owner --no-privileges --no-comments --no-acl --file backup.sql"
        );
    }

    #[test]
    fn test_optional_flags() {
        let mut a = args();
        a.data_only = true;
        a.column_inserts = true;
        let shown = build_command(&source(), "pw", &a, &PathBuf::from("b.sql")).display();
        assert!(shown.contains("--data-only --column-inserts"));
        assert!(!shown.contains("pw"));
    }
}
