//! Rewrite policy for a single migration run.
//!
//! A [`RewritePolicy`] names the destination schema, the role that should own
//! every migrated object, and the source-platform administrative roles whose
//! statements must be stripped from the dump. It is built once per run and
//! never mutated after the rule set has been derived from it; the `with_*`
//! methods return new values instead.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::errors::{Result, ShiftError};

/// Schema the dump is imported into when nothing else is configured.
pub const DEFAULT_TARGET_SCHEMA: &str = "public";

/// Superuser-equivalent role on the destination.
pub const DEFAULT_TARGET_OWNER: &str = "postgres";

/// Administrative roles created by Cloud SQL for its own management.
pub const DEFAULT_ADMIN_ROLES: &[&str] = &[
    "cloudsqladmin",
    "cloudsqlagent",
    "cloudsqliamserviceaccount",
    "cloudsqliamuser",
    "cloudsqlimportexport",
    "cloudsqlreplica",
    "cloudsqlsuperuser",
];

/// Target-environment policy that drives rule construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RewritePolicy {
    /// Schema that objects from `public` are retargeted into.
    pub target_schema: String,
    /// Role written into every `OWNER TO` clause.
    pub target_owner: String,
    /// Roles whose grants, ownership and session switches are dropped.
    /// Ordered so the derived rules are identical across runs.
    pub admin_roles_to_strip: BTreeSet<String>,
}

impl Default for RewritePolicy {
    fn default() -> Self {
        Self {
            target_schema: DEFAULT_TARGET_SCHEMA.to_string(),
            target_owner: DEFAULT_TARGET_OWNER.to_string(),
            admin_roles_to_strip: DEFAULT_ADMIN_ROLES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl RewritePolicy {
    pub fn new(
        target_schema: impl Into<String>,
        target_owner: impl Into<String>,
        admin_roles_to_strip: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            target_schema: target_schema.into(),
            target_owner: target_owner.into(),
            admin_roles_to_strip: admin_roles_to_strip.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_target_schema(mut self, schema: impl Into<String>) -> Self {
        self.target_schema = schema.into();
        self
    }

    pub fn with_target_owner(mut self, owner: impl Into<String>) -> Self {
        self.target_owner = owner.into();
        self
    }

    /// Replaces the stripped-role set. An empty iterator disables role stripping.
    pub fn with_admin_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.admin_roles_to_strip = roles.into_iter().map(Into::into).collect();
        self
    }

    /// True when objects stay in `public` and no retargeting is needed.
    pub fn targets_public(&self) -> bool {
        self.target_schema.eq_ignore_ascii_case(DEFAULT_TARGET_SCHEMA)
    }

    /// Rejects values that would produce broken SQL or an unusable rule set.
    pub fn validate(&self) -> Result<()> {
        if self.target_schema.trim().is_empty() {
            return Err(ShiftError::config("target_schema", "must not be empty"));
        }
        if self.target_owner.trim().is_empty() {
            return Err(ShiftError::config("target_owner", "must not be empty"));
        }
        if let Some(bad) = self
            .admin_roles_to_strip
            .iter()
            .find(|r| r.trim().is_empty() || r.trim() != r.as_str())
        {
            return Err(ShiftError::config(
                "admin_roles_to_strip",
                format!("role name '{}' is empty or has surrounding whitespace", bad),
            ));
        }
        Ok(())
    }

    /// Loads a policy from a YAML file. Keys that are absent keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rewrite policy from: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShiftError::config("policy", format!("file {} does not exist", path.display()))
            } else {
                ShiftError::io(path, None, e)
            }
        })?;
        let policy: RewritePolicy = serde_yml::from_str(&text).map_err(|source| ShiftError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        policy.validate()?;
        debug!(
            "Loaded policy: schema='{}', owner='{}', {} stripped role(s).",
            policy.target_schema,
            policy.target_owner,
            policy.admin_roles_to_strip.len()
        );
        Ok(policy)
    }
}

/// Splits a comma-separated role list, dropping blanks.
pub fn parse_role_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RewritePolicy::default();
        assert_eq!(policy.target_schema, "public");
        assert_eq!(policy.target_owner, "postgres");
        assert!(policy.admin_roles_to_strip.contains("cloudsqlsuperuser"));
        assert!(policy.targets_public());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_overrides_do_not_touch_defaults() {
        let custom = RewritePolicy::default()
            .with_target_schema("analytics")
            .with_target_owner("app_owner")
            .with_admin_roles(["rds_superuser"]);
        assert_eq!(custom.target_schema, "analytics");
        assert!(!custom.targets_public());
        assert_eq!(custom.admin_roles_to_strip.len(), 1);

        let fresh = RewritePolicy::default();
        assert_eq!(fresh.target_schema, "public");
        assert_eq!(fresh.admin_roles_to_strip.len(), DEFAULT_ADMIN_ROLES.len());
    }

    #[test]
    fn test_validate_rejects_empty_owner() {
        let policy = RewritePolicy::default().with_target_owner("  ");
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("target_owner"));
    }

    #[test]
    fn test_validate_rejects_blank_role() {
        let policy = RewritePolicy::default().with_admin_roles(["ok", " padded"]);
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("admin_roles_to_strip"));
    }

    #[test]
    fn test_parse_role_list() {
        let roles = parse_role_list(" a, b ,,c ");
        assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
