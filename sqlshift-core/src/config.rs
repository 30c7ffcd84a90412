//! Configuration management for `sqlshift-core`.
//!
//! Connection settings for the source and destination servers, the dump file
//! locations and the policy overrides are read from the environment once at
//! process start into a [`MigrationConfig`]. Lookups go through a closure so
//! tests can supply their own variables instead of mutating the process
//! environment.
//!
//! License: MIT OR Apache-2.0

use log::debug;
use serde::Serialize;
use std::path::PathBuf;

use crate::errors::{Result, ShiftError};
use crate::policy::{parse_role_list, RewritePolicy};

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_TARGET_DB: &str = "postgres";
pub const DEFAULT_SSLMODE: &str = "require";
pub const DEFAULT_OUTPUT_DUMP: &str = "backup.sql";
pub const DEFAULT_CLEANED_DUMP: &str = "cleaned_backup.sql";

/// Connection parameters for one Postgres server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
    /// `None` means the password is prompted for when needed.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Destination connection plus TLS mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSettings {
    #[serde(flatten)]
    pub connection: ConnectionSettings,
    pub sslmode: String,
}

/// Everything a migration run needs, resolved once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationConfig {
    pub source: Option<ConnectionSettings>,
    pub target: Option<TargetSettings>,
    pub output_dump: PathBuf,
    pub cleaned_dump: PathBuf,
    pub policy: RewritePolicy,
}

/// Which connections a command needs validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub source: bool,
    pub target: bool,
}

impl Requirements {
    pub const NONE: Requirements = Requirements { source: false, target: false };
    pub const SOURCE: Requirements = Requirements { source: true, target: false };
    pub const TARGET: Requirements = Requirements { source: false, target: true };
    pub const BOTH: Requirements = Requirements { source: true, target: true };
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| ShiftError::config(key, "environment variable is not set"))
    }

    fn port(&self, key: &str) -> Result<u16> {
        match self.optional(key) {
            None => Ok(DEFAULT_PORT),
            Some(raw) => parse_port(key, &raw),
        }
    }
}

/// Parses a TCP port, rejecting zero, negatives and garbage.
pub fn parse_port(field: &str, raw: &str) -> Result<u16> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ShiftError::config(field, format!("'{}' is not an integer", raw)))?;
    if value <= 0 || value > i64::from(u16::MAX) {
        return Err(ShiftError::config(
            field,
            format!("must be a positive integer no greater than {}, got {}", u16::MAX, value),
        ));
    }
    Ok(value as u16)
}

impl MigrationConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env(required: Requirements) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), required)
    }

    /// Reads the configuration through `lookup`, validating only the
    /// connections named in `required`.
    pub fn from_lookup<F>(lookup: F, required: Requirements) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let source = if required.source {
            Some(ConnectionSettings {
                user: env.required("CLOUDSQL_USER")?,
                host: env.required("CLOUDSQL_HOST")?,
                database: env.required("CLOUDSQL_DB")?,
                port: env.port("CLOUDSQL_PORT")?,
                password: env.optional("CLOUDSQL_PASSWORD"),
            })
        } else {
            None
        };

        let target = if required.target {
            Some(TargetSettings {
                connection: ConnectionSettings {
                    user: env.required("SUPABASE_USER")?,
                    host: env.required("SUPABASE_HOST")?,
                    database: env
                        .optional("SUPABASE_DB")
                        .unwrap_or_else(|| DEFAULT_TARGET_DB.to_string()),
                    port: env.port("SUPABASE_PORT")?,
                    password: Some(env.required("SUPABASE_PASSWORD")?),
                },
                sslmode: env
                    .optional("SUPABASE_SSLMODE")
                    .unwrap_or_else(|| DEFAULT_SSLMODE.to_string()),
            })
        } else {
            None
        };

        let mut policy = RewritePolicy::default();
        if let Some(schema) = env.optional("TARGET_SCHEMA") {
            policy = policy.with_target_schema(schema);
        }
        if let Some(owner) = env.optional("TARGET_OWNER") {
            policy = policy.with_target_owner(owner);
        }
        if let Some(roles) = (env.lookup)("STRIP_ROLES") {
            policy = policy.with_admin_roles(parse_role_list(&roles));
        }
        policy.validate()?;

        let config = MigrationConfig {
            source,
            target,
            output_dump: env
                .optional("OUTPUT_DUMP")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DUMP.to_string())
                .into(),
            cleaned_dump: env
                .optional("CLEANED_DUMP")
                .unwrap_or_else(|| DEFAULT_CLEANED_DUMP.to_string())
                .into(),
            policy,
        };
        debug!(
            "Resolved configuration: source={}, target={}, dump={}, cleaned={}",
            config.source.is_some(),
            config.target.is_some(),
            config.output_dump.display(),
            config.cleaned_dump.display()
        );
        Ok(config)
    }
}
