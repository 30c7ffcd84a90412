// sqlshift-core/src/headless.rs

//! `headless.rs`
//! Convenience wrapper for rewriting an in-memory dump in one call.
//! Useful for small fixtures and for callers that already hold the text.

use std::io::Cursor;

use crate::engine::DumpRewriter;
use crate::errors::Result;
use crate::policy::RewritePolicy;
use crate::report::{NullReporter, RunReport};

/// Rewrites `content` under `policy` and returns the new text with its report.
pub fn headless_rewrite_string(policy: RewritePolicy, content: &str) -> Result<(String, RunReport)> {
    let rewriter = DumpRewriter::new(policy)?;
    let mut out = Vec::with_capacity(content.len());
    let report = rewriter.rewrite_stream(Cursor::new(content), &mut out, &mut NullReporter)?;
    // Every line written is either input text or built from UTF-8 templates.
    let text = String::from_utf8_lossy(&out).into_owned();
    Ok((text, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_rewrite_string() {
        let content = "CREATE ROLE cloudsqlsuperuser;\nCREATE TABLE public.t (id int);\nALTER TABLE public.t OWNER TO bob;\n";
        let policy = RewritePolicy::default().with_target_schema("analytics");
        let (out, report) = headless_rewrite_string(policy, content).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("-- SKIPPED LINE"));
        assert_eq!(lines[1], "CREATE TABLE \"analytics\".t (id int);");
        assert_eq!(lines[2], "ALTER TABLE \"analytics\".t OWNER TO postgres;");
        assert_eq!(report.processed, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rewritten, 2);
    }

    #[test]
    fn test_headless_rejects_invalid_policy() {
        let policy = RewritePolicy::default().with_target_owner("");
        assert!(headless_rewrite_string(policy, "SELECT 1;").is_err());
    }
}
