//! `clean`: rewrite a dump file for the destination.
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::{self, Write};
use std::path::Path;

use sqlshift_core::{DumpRewriter, LogReporter, MigrationConfig, RewritePolicy, RunReport};

use crate::cli::{CleanCommand, ReportArgs};
use crate::commands::resolve_policy;
use crate::ui::output_format::Console;
use crate::ui::run_summary;

/// Runs the `clean` command.
pub fn run(config: &MigrationConfig, cmd: &CleanCommand, console: &Console) -> Result<RunReport> {
    let input = cmd.input.clone().unwrap_or_else(|| config.output_dump.clone());
    let output = cmd.output.clone().unwrap_or_else(|| config.cleaned_dump.clone());
    let policy = resolve_policy(&cmd.policy, &config.policy)?;
    let rewriter = build_rewriter(policy)?;
    rewrite(&rewriter, &input, &output, &cmd.report, console)
}

/// Compiles the rule set for `policy`.
pub fn build_rewriter(policy: RewritePolicy) -> Result<DumpRewriter> {
    let rewriter = DumpRewriter::new(policy).context("Failed to compile rewrite rules")?;
    debug!("Rule set fingerprint: {}", rewriter.rules().fingerprint());
    Ok(rewriter)
}

/// Rewrites `input` into `output` and reports the outcome. Shared with `migrate`.
pub fn rewrite(
    rewriter: &DumpRewriter,
    input: &Path,
    output: &Path,
    report_args: &ReportArgs,
    console: &Console,
) -> Result<RunReport> {
    console.info(format!("Rewriting {} -> {}", input.display(), output.display()));
    let mut reporter = LogReporter::new(input.display().to_string());
    let report = rewriter
        .rewrite_file(input, output, &mut reporter)
        .with_context(|| format!("Failed to rewrite {}", input.display()))?;

    if !console.quiet && !report_args.no_summary {
        let mut stderr = io::stderr();
        run_summary::print_summary(&report, &mut stderr, console.colors)
            .context("Failed to print the rewrite summary")?;
    }
    write_report(&report, report_args)?;

    info!("Cleaned dump written to {}", output.display());
    console.success(format!("Cleaned dump written to {}", output.display()));
    Ok(report)
}

fn write_report(report: &RunReport, args: &ReportArgs) -> Result<()> {
    if args.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, report).context("Failed to serialize the run report")?;
        writeln!(handle)?;
    } else if let Some(path) = &args.report_file {
        write_report_file(report, path)?;
    }
    Ok(())
}

fn write_report_file(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize the run report")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    debug!("Run report written to {}", path.display());
    Ok(())
}
