//! This file defines the command-line interface (CLI) for the sqlshift application,
//! including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "sqlshift",
    version = env!("CARGO_PKG_VERSION"),
    about = "Move a PostgreSQL database between hosts",
    long_about = "sqlshift exports a database with pg_dump, rewrites the dump so that roles, ownership and schema layout specific to the source platform are neutralized, and replays the result on the destination with psql inside a single transaction. Connection settings are read from the environment or a .env file.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `sqlshift` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exports the source database to a dump file with pg_dump.
    #[command(about = "Export the source database to a dump file with pg_dump.")]
    Export(ExportArgs),

    /// Rewrites a dump file for the destination.
    #[command(about = "Rewrite a dump so it can be replayed on the destination.")]
    Clean(CleanCommand),

    /// Replays a cleaned dump on the destination with psql.
    #[command(about = "Replay a cleaned dump on the destination in a single transaction.")]
    Import(ImportArgs),

    /// Runs export, clean and import in sequence.
    #[command(about = "Export, clean and import in one run.")]
    Migrate(MigrateCommand),
}

/// Options controlling the rewrite policy. Flags win over a policy file,
/// which wins over the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Load the rewrite policy from a YAML file.
    #[arg(long = "policy", value_name = "FILE", help = "Load the rewrite policy from a YAML file.")]
    pub policy: Option<PathBuf>,

    /// Schema that objects in `public` are moved into.
    #[arg(long = "target-schema", value_name = "SCHEMA", help = "Schema to import into (default: public).")]
    pub target_schema: Option<String>,

    /// Role that owns every migrated object.
    #[arg(long = "target-owner", value_name = "ROLE", help = "Role written into every OWNER TO clause (default: postgres).")]
    pub target_owner: Option<String>,

    /// Administrative roles to strip (comma-separated).
    #[arg(long = "strip-roles", value_name = "ROLES", value_delimiter = ',', help = "Administrative roles whose statements are dropped (comma-separated).")]
    pub strip_roles: Option<Vec<String>>,

    /// Disable role stripping entirely.
    #[arg(long = "no-strip-roles", conflicts_with = "strip_roles", help = "Do not strip any administrative roles.")]
    pub no_strip_roles: bool,
}

/// Arguments for the `export` step.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Where pg_dump writes the dump.
    #[arg(long = "dump", value_name = "FILE", help = "Dump file to write (default: $OUTPUT_DUMP or backup.sql).")]
    pub dump: Option<PathBuf>,

    /// Dump only the data, not the schema.
    #[arg(long = "data-only", help = "Dump only the data, not the schema.")]
    pub data_only: bool,

    /// Emit INSERT statements with explicit column names.
    #[arg(long = "column-inserts", help = "Dump data as INSERT commands with column names.")]
    pub column_inserts: bool,

    /// pg_dump executable to run.
    #[arg(long = "pg-dump-bin", value_name = "PATH", env = "PG_DUMP_BIN", default_value = "pg_dump", help = "pg_dump executable to run.")]
    pub pg_dump_bin: PathBuf,
}

/// Arguments for the `clean` command.
#[derive(Args, Debug, Clone)]
pub struct CleanCommand {
    /// Dump to rewrite.
    #[arg(long, short = 'i', value_name = "FILE", help = "Dump file to rewrite (default: $OUTPUT_DUMP or backup.sql).")]
    pub input: Option<PathBuf>,

    /// Where the rewritten dump is written.
    #[arg(long, short = 'o', value_name = "FILE", help = "Rewritten dump to write (default: $CLEANED_DUMP or cleaned_backup.sql).")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Reporting options shared by `clean` and `migrate`.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Print the run report as JSON to stdout.
    #[arg(long = "json", conflicts_with = "report_file", help = "Print the run report to stdout as JSON.")]
    pub json: bool,

    /// Write the run report as JSON to a file.
    #[arg(long = "report-file", value_name = "FILE", help = "Write the run report to a JSON file.")]
    pub report_file: Option<PathBuf>,

    /// Suppress the rewrite summary.
    #[arg(long = "no-summary", help = "Suppress the rewrite summary.")]
    pub no_summary: bool,
}

/// Arguments for the `import` step.
#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Cleaned dump to replay.
    #[arg(long, short = 'i', value_name = "FILE", help = "Cleaned dump to replay (default: $CLEANED_DUMP or cleaned_backup.sql).")]
    pub input: Option<PathBuf>,

    /// psql executable to run.
    #[arg(long = "psql-bin", value_name = "PATH", env = "PSQL_BIN", default_value = "psql", help = "psql executable to run.")]
    pub psql_bin: PathBuf,
}

/// Arguments for the `migrate` command.
#[derive(Args, Debug, Clone)]
pub struct MigrateCommand {
    #[command(flatten)]
    pub export: ExportArgs,

    /// Where the rewritten dump is written.
    #[arg(long = "cleaned", value_name = "FILE", help = "Rewritten dump to write (default: $CLEANED_DUMP or cleaned_backup.sql).")]
    pub cleaned: Option<PathBuf>,

    /// psql executable to run.
    #[arg(long = "psql-bin", value_name = "PATH", env = "PSQL_BIN", default_value = "psql", help = "psql executable to run.")]
    pub psql_bin: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,

    #[command(flatten)]
    pub report: ReportArgs,
}
