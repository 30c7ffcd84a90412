//! compiler.rs - Derives and compiles the rule tables for a policy.
//!
//! Rule construction is a pure function of the [`RewritePolicy`]: the same
//! policy always yields the same patterns, in the same order, with the same
//! templates. Every pattern is compiled case-insensitively. Statement keywords
//! are anchored at the start of the line (after whitespace) and role names are
//! word-bounded or double-quoted.
//!
//! Any value taken from the policy is escaped before it is embedded, both in
//! patterns (`regex::escape`) and in replacement templates (`$` doubled).
//!
//! License: MIT OR APACHE 2.0

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::RegexBuilder;

use super::{Action, Rule, RuleSet};
use crate::errors::{Result, ShiftError};
use crate::policy::{RewritePolicy, DEFAULT_TARGET_SCHEMA};

/// Extensions every managed Postgres ships with; their comments differ per host.
pub const BUILTIN_EXTENSIONS: &[&str] = &[
    "plpgsql",
    "pg_stat_statements",
    "pgcrypto",
    "uuid-ossp",
    "pg_trgm",
    "hstore",
    "citext",
    "postgis",
    "vector",
];

/// Session parameters the destination refuses or overrides.
pub const UNSUPPORTED_SESSION_SETTINGS: &[&str] = &[
    "transaction_timeout",
    "lock_timeout",
    "statement_timeout",
    "idle_in_transaction_session_timeout",
    "idle_session_timeout",
    "default_transaction_read_only",
    "transaction_read_only",
];

/// Compiled-size ceiling for a single rule.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A bare or double-quoted SQL identifier.
const IDENT: &str = r#"(?:"(?:[^"]|"")+"|[A-Za-z_][A-Za-z0-9_$]*)"#;

static BUILTIN_EXTENSION_PATTERN: Lazy<String> = Lazy::new(|| {
    let names = alternation(BUILTIN_EXTENSIONS);
    format!(r#"^\s*COMMENT\s+ON\s+EXTENSION\s+(?:"(?:{names})"|(?:{names})\b)"#)
});

static SESSION_SETTING_PATTERN: Lazy<String> = Lazy::new(|| {
    let names = alternation(UNSUPPORTED_SESSION_SETTINGS);
    format!(r"^\s*SET\s+(?:(?:SESSION|LOCAL)\s+)?(?:{names})\s*(?:=|\bTO\b)")
});

/// An uncompiled rule: name, pattern source and action.
struct RuleSpec {
    name: &'static str,
    pattern: String,
    action: Action,
}

impl RuleSpec {
    fn skip(name: &'static str, pattern: impl Into<String>) -> Self {
        Self {
            name,
            pattern: pattern.into(),
            action: Action::Skip,
        }
    }

    fn rewrite(name: &'static str, pattern: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name,
            pattern: pattern.into(),
            action: Action::Rewrite(template.into()),
        }
    }
}

/// Escapes each literal and joins them into a regex alternation body.
fn alternation<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| regex::escape(s.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Matches any of `names` either bare (word-bounded) or double-quoted.
fn name_pattern<S: AsRef<str>>(names: &[S]) -> String {
    let bare = alternation(names);
    let quoted = names
        .iter()
        .map(|n| regex::escape(&n.as_ref().replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join("|");
    format!(r#"(?:\b(?:{bare})\b|"(?:{quoted})")"#)
}

/// Escapes a literal for use inside a replacement template.
fn template_literal(s: &str) -> String {
    s.replace('$', "$$")
}

/// Renders a role name the way `pg_dump` would: bare when it is a plain
/// lowercase identifier, double-quoted otherwise.
pub fn sql_ident(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        }
        _ => false,
    };
    if plain {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

/// Always double-quotes an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn skip_specs(policy: &RewritePolicy) -> Vec<RuleSpec> {
    let mut specs = vec![
        RuleSpec::skip("create_alter_role", r"^\s*(?:CREATE|ALTER)\s+ROLE\b"),
        RuleSpec::skip("comment_on_builtin_extension", BUILTIN_EXTENSION_PATTERN.as_str()),
        RuleSpec::skip("comment_on_extension", r"^\s*COMMENT\s+ON\s+EXTENSION\b"),
        RuleSpec::skip("unsupported_session_setting", SESSION_SETTING_PATTERN.as_str()),
    ];

    if policy.admin_roles_to_strip.is_empty() {
        debug!("No administrative roles to strip; role skip rules omitted.");
        return specs;
    }

    let roles: Vec<&str> = policy.admin_roles_to_strip.iter().map(String::as_str).collect();
    let role = name_pattern(&roles);
    specs.extend([
        RuleSpec::skip(
            "set_role_stripped",
            format!(
                r"^\s*SET\s+(?:(?:SESSION|LOCAL)\s+)?(?:ROLE|SESSION\s+AUTHORIZATION)\s+(?:TO\s+|=\s*)?'?{role}"
            ),
        ),
        RuleSpec::skip("grant_revoke_stripped", format!(r"^\s*(?:GRANT|REVOKE)\b.*{role}")),
        RuleSpec::skip(
            "default_privileges_stripped",
            format!(r"^\s*ALTER\s+DEFAULT\s+PRIVILEGES\b.*{role}"),
        ),
        RuleSpec::skip(
            "owner_to_stripped",
            format!(r"^\s*ALTER\s+\w.*\bOWNER\s+TO\s+{role}"),
        ),
    ]);
    specs
}

fn rewrite_specs(policy: &RewritePolicy) -> Vec<RuleSpec> {
    let owner = template_literal(&sql_ident(&policy.target_owner));
    let schema = template_literal(&quote_ident(&policy.target_schema));

    let mut managed: Vec<&str> = vec![DEFAULT_TARGET_SCHEMA];
    if !policy.targets_public() {
        managed.push(policy.target_schema.as_str());
    }
    let managed = name_pattern(&managed);

    let mut specs = vec![
        RuleSpec::rewrite(
            "owner_to",
            format!(r"\bOWNER\s+TO\s+{IDENT}\s*;"),
            format!("OWNER TO {owner};"),
        ),
        RuleSpec::rewrite(
            "create_schema_authorization",
            format!(r"^\s*CREATE\s+SCHEMA\s+(?:IF\s+NOT\s+EXISTS\s+)?AUTHORIZATION\s+(?P<role>{IDENT}).*$"),
            "-- CREATE SCHEMA AUTHORIZATION ${role} suppressed: source-side schemas are not recreated",
        ),
        RuleSpec::rewrite(
            "create_schema_managed",
            format!(r"^\s*CREATE\s+SCHEMA\s+(?:IF\s+NOT\s+EXISTS\s+)?(?P<schema>{managed}).*$"),
            "-- CREATE SCHEMA ${schema} suppressed: schema is provided by the destination",
        ),
        RuleSpec::rewrite(
            "create_schema_other",
            format!(r"^\s*CREATE\s+SCHEMA\s+(?:IF\s+NOT\s+EXISTS\s+)?(?P<schema>{IDENT}).*$"),
            "-- CREATE SCHEMA ${schema} suppressed: source-side schemas are not recreated",
        ),
        RuleSpec::rewrite(
            "public_schema_owner",
            r#"^\s*ALTER\s+SCHEMA\s+(?:\bpublic\b|"public")\s+OWNER\s+TO\b.*$"#,
            "-- ALTER SCHEMA public OWNER TO suppressed: ownership is managed by the destination",
        ),
        RuleSpec::rewrite(
            "search_path_reset",
            r"^\s*SELECT\s+pg_catalog\.set_config\(\s*'search_path'\s*,\s*''\s*,\s*false\s*\)\s*;.*$",
            "-- search_path reset suppressed: SELECT pg_catalog.set_config('search_path', '', false);",
        ),
    ];

    if policy.targets_public() {
        specs.push(RuleSpec::rewrite(
            "search_path_default",
            r"^(?P<indent>\s*)SET\s+search_path\s*(?:=|\bTO\b)[^;]*;",
            "${indent}SET search_path = public, pg_catalog;",
        ));
    } else {
        specs.push(RuleSpec::rewrite(
            "search_path_retarget",
            r#"^(?P<indent>\s*)SET\s+search_path\s*(?:=|\bTO\b)\s*(?:\bpublic\b|"public")"#,
            format!("${{indent}}SET search_path = {schema}, public"),
        ));
        specs.push(RuleSpec::rewrite(
            "public_qualifier",
            r#"\bpublic\.(?P<next>[A-Za-z_"])"#,
            format!("{schema}.${{next}}"),
        ));
    }
    specs
}

fn compile_spec(spec: RuleSpec) -> Result<Rule> {
    debug!("Compiling rule '{}' with pattern '{}'", spec.name, spec.pattern);
    let regex = RegexBuilder::new(&spec.pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|source| {
            error!(
                "Rule '{}' has an invalid pattern '{}': {}",
                spec.name, spec.pattern, source
            );
            ShiftError::PatternCompilation {
                rule: spec.name.to_string(),
                pattern: spec.pattern.clone(),
                source,
            }
        })?;
    Ok(Rule {
        name: spec.name,
        regex,
        action: spec.action,
    })
}

/// Builds the skip and rewrite tables for `policy`.
///
/// The policy is validated first; the first pattern that fails to compile
/// aborts construction.
pub fn compile_rule_set(policy: &RewritePolicy) -> Result<RuleSet> {
    policy.validate()?;

    let skip_rules = skip_specs(policy)
        .into_iter()
        .map(compile_spec)
        .collect::<Result<Vec<_>>>()?;
    let rewrite_rules = rewrite_specs(policy)
        .into_iter()
        .map(compile_spec)
        .collect::<Result<Vec<_>>>()?;

    let rules = RuleSet {
        skip_rules,
        rewrite_rules,
    };
    debug!(
        "Compiled {} skip and {} rewrite rules (fingerprint {}).",
        rules.skip_rules.len(),
        rules.rewrite_rules.len(),
        rules.fingerprint()
    );
    Ok(rules)
}

impl RuleSet {
    /// Derives the rule tables for `policy`. See [`compile_rule_set`].
    pub fn from_policy(policy: &RewritePolicy) -> Result<Self> {
        compile_rule_set(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rules: &[Rule]) -> Vec<&'static str> {
        rules.iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_rule_order_for_public_target() {
        let rules = compile_rule_set(&RewritePolicy::default()).unwrap();
        assert_eq!(
            names(rules.skip_rules()),
            vec![
                "create_alter_role",
                "comment_on_builtin_extension",
                "comment_on_extension",
                "unsupported_session_setting",
                "set_role_stripped",
                "grant_revoke_stripped",
                "default_privileges_stripped",
                "owner_to_stripped",
            ]
        );
        assert_eq!(
            names(rules.rewrite_rules()),
            vec![
                "owner_to",
                "create_schema_authorization",
                "create_schema_managed",
                "create_schema_other",
                "public_schema_owner",
                "search_path_reset",
                "search_path_default",
            ]
        );
    }

    #[test]
    fn test_retargeting_rules_replace_default_search_path() {
        let policy = RewritePolicy::default().with_target_schema("analytics");
        let rules = compile_rule_set(&policy).unwrap();
        let rewrite = names(rules.rewrite_rules());
        assert!(rewrite.contains(&"search_path_retarget"));
        assert!(rewrite.contains(&"public_qualifier"));
        assert!(!rewrite.contains(&"search_path_default"));
    }

    #[test]
    fn test_no_role_rules_without_roles() {
        let policy = RewritePolicy::default().with_admin_roles(Vec::<String>::new());
        let rules = compile_rule_set(&policy).unwrap();
        assert_eq!(rules.skip_rules().len(), 4);
        assert!(rules.find("grant_revoke_stripped").is_none());
    }

    #[test]
    fn test_same_policy_same_fingerprint() {
        let policy = RewritePolicy::default().with_target_schema("analytics");
        let a = compile_rule_set(&policy).unwrap();
        let b = compile_rule_set(&policy.clone()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let other = compile_rule_set(&RewritePolicy::default()).unwrap();
        assert_ne!(a.fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_role_names_are_escaped() {
        let policy = RewritePolicy::default().with_admin_roles(["weird.role(1)", "a|b"]);
        let rules = compile_rule_set(&policy).unwrap();
        let grant = rules.find("grant_revoke_stripped").unwrap();
        assert!(grant.regex.is_match(r#"GRANT ALL ON TABLE t TO "weird.role(1)";"#));
        assert!(grant.regex.is_match("GRANT ALL ON TABLE t TO a|b;"));
        assert!(!grant.regex.is_match("GRANT ALL ON TABLE t TO weirdxrole1;"));
        assert!(!grant.regex.is_match("GRANT ALL ON TABLE t TO a;"));
    }

    #[test]
    fn test_role_names_are_word_bounded() {
        let rules = compile_rule_set(&RewritePolicy::default()).unwrap();
        let grant = rules.find("grant_revoke_stripped").unwrap();
        assert!(grant.regex.is_match("GRANT ALL ON SCHEMA public TO cloudsqlsuperuser;"));
        assert!(grant.regex.is_match(r#"GRANT ALL ON SCHEMA public TO "cloudsqlsuperuser";"#));
        assert!(!grant.regex.is_match("GRANT ALL ON SCHEMA public TO cloudsqlsuperuser_app;"));
    }

    #[test]
    fn test_keywords_are_line_anchored() {
        let rules = compile_rule_set(&RewritePolicy::default()).unwrap();
        let role = rules.find("create_alter_role").unwrap();
        assert!(role.regex.is_match("  create role app;"));
        assert!(!role.regex.is_match("INSERT INTO notes VALUES ('CREATE ROLE app');"));
    }

    #[test]
    fn test_session_settings() {
        let rules = compile_rule_set(&RewritePolicy::default()).unwrap();
        let rule = rules.find("unsupported_session_setting").unwrap();
        assert!(rule.regex.is_match("SET statement_timeout = 0;"));
        assert!(rule.regex.is_match("SET idle_in_transaction_session_timeout = 0;"));
        assert!(rule.regex.is_match("SET transaction_timeout TO 0;"));
        assert!(!rule.regex.is_match("SET client_encoding = 'UTF8';"));
    }

    #[test]
    fn test_sql_ident() {
        assert_eq!(sql_ident("postgres"), "postgres");
        assert_eq!(sql_ident("app_owner$1"), "app_owner$1");
        assert_eq!(sql_ident("AppOwner"), "\"AppOwner\"");
        assert_eq!(sql_ident("my-role"), "\"my-role\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_owner_with_dollar_is_literal_in_template() {
        let policy = RewritePolicy::default().with_target_owner("owner$1");
        let rules = compile_rule_set(&policy).unwrap();
        let rule = rules.find("owner_to").unwrap();
        let out = match &rule.action {
            Action::Rewrite(t) => rule.regex.replace_all("ALTER TABLE t OWNER TO x;", t.as_str()),
            Action::Skip => unreachable!(),
        };
        assert_eq!(out, "ALTER TABLE t OWNER TO owner$1;");
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let policy = RewritePolicy::default().with_target_schema("");
        assert!(matches!(
            compile_rule_set(&policy),
            Err(ShiftError::Config { .. })
        ));
    }

    #[test]
    fn test_bad_pattern_names_rule_and_pattern() {
        let err = compile_spec(RuleSpec::skip("unbalanced_group", "(")).unwrap_err();
        match err {
            ShiftError::PatternCompilation { rule, pattern, .. } => {
                assert_eq!(rule, "unbalanced_group");
                assert_eq!(pattern, "(");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_default_privileges_grantee_is_stripped() {
        let rules = compile_rule_set(&RewritePolicy::default()).unwrap();
        let rule = rules.find("default_privileges_stripped").unwrap();
        assert!(rule.regex.is_match(
            "ALTER DEFAULT PRIVILEGES FOR ROLE app IN SCHEMA public GRANT SELECT ON TABLES TO cloudsqlsuperuser;"
        ));
        assert!(rule.regex.is_match("ALTER DEFAULT PRIVILEGES FOR ROLE cloudsqladmin GRANT ALL ON TABLES TO app;"));
        assert!(!rule.regex.is_match("ALTER DEFAULT PRIVILEGES FOR ROLE app GRANT SELECT ON TABLES TO reader;"));
    }

    #[test]
    fn test_create_schema_authorization_keeps_role_name() {
        let rules = compile_rule_set(&RewritePolicy::default()).unwrap();
        let rule = rules.find("create_schema_authorization").unwrap();
        let out = match &rule.action {
            Action::Rewrite(t) => rule.regex.replace_all("CREATE SCHEMA AUTHORIZATION joe;", t.as_str()),
            Action::Skip => unreachable!(),
        };
        assert_eq!(
            out,
            "-- CREATE SCHEMA AUTHORIZATION joe suppressed: source-side schemas are not recreated"
        );
    }
}
