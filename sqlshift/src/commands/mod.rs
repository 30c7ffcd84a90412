//! Command implementations for the sqlshift CLI.
//!
//! Each command resolves its configuration first and fails before any file
//! or process work if something required is missing.

pub mod clean;
pub mod export;
pub mod import;
pub mod migrate;

use anyhow::{Context, Result};
use log::debug;

use sqlshift_core::{MigrationConfig, Requirements, RewritePolicy};

use crate::cli::{Cli, Commands, PolicyArgs};
use crate::ui::output_format::Console;

/// Runs the parsed command line.
pub fn dispatch(cli: Cli) -> Result<()> {
    let console = Console::stderr(cli.quiet);

    let required = match &cli.command {
        Commands::Export(_) => Requirements::SOURCE,
        Commands::Clean(_) => Requirements::NONE,
        Commands::Import(_) => Requirements::TARGET,
        Commands::Migrate(_) => Requirements::BOTH,
    };
    let config = MigrationConfig::from_env(required).context("Invalid configuration")?;

    match cli.command {
        Commands::Export(args) => export::run(&config, &args, &console).map(|_| ()),
        Commands::Clean(cmd) => clean::run(&config, &cmd, &console).map(|_| ()),
        Commands::Import(args) => import::run(&config, &args, &console),
        Commands::Migrate(cmd) => migrate::run(&config, &cmd, &console),
    }
}

/// Combines the environment-derived policy with a policy file and flags.
///
/// A policy file replaces the environment-derived policy; flags then override
/// individual fields.
pub fn resolve_policy(args: &PolicyArgs, from_env: &RewritePolicy) -> Result<RewritePolicy> {
    let mut policy = match &args.policy {
        Some(path) => RewritePolicy::load_from_file(path)
            .with_context(|| format!("Failed to load policy file {}", path.display()))?,
        None => from_env.clone(),
    };

    if let Some(schema) = &args.target_schema {
        policy = policy.with_target_schema(schema.clone());
    }
    if let Some(owner) = &args.target_owner {
        policy = policy.with_target_owner(owner.clone());
    }
    if args.no_strip_roles {
        policy = policy.with_admin_roles(Vec::<String>::new());
    } else if let Some(roles) = &args.strip_roles {
        policy = policy.with_admin_roles(
            roles.iter().map(|r| r.trim()).filter(|r| !r.is_empty()).map(str::to_string),
        );
    }

    policy.validate().context("Invalid rewrite policy")?;
    debug!(
        "Resolved policy: schema='{}', owner='{}', stripped roles=[{}]",
        policy.target_schema,
        policy.target_owner,
        policy.admin_roles_to_strip.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    Ok(policy)
}
