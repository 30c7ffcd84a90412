//! Human-readable summary of a rewrite run.

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::{self, Write};

use sqlshift_core::RunReport;

/// Prints the run counters followed by a per-rule table.
pub fn print_summary<W: Write>(report: &RunReport, w: &mut W, colors: bool) -> io::Result<()> {
    let header = "--- Rewrite Summary ---";
    if colors {
        writeln!(w, "{}", header.bold())?;
    } else {
        writeln!(w, "{}", header)?;
    }
    writeln!(w, "Lines processed: {}", report.processed)?;
    writeln!(w, "Lines skipped: {}", report.skipped)?;
    writeln!(w, "Lines rewritten: {}", report.rewritten)?;
    writeln!(w, "Substitutions: {}", report.modified)?;

    if report.rule_hits.is_empty() {
        writeln!(w, "No rules matched.")?;
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Rule", "Hits"]);
    for (rule, hits) in &report.rule_hits {
        table.add_row(vec![
            Cell::new(rule),
            Cell::new(hits).set_alignment(CellAlignment::Right),
        ]);
    }
    writeln!(w, "{}", table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_rules() {
        let mut report = RunReport::new();
        report.processed = 3;
        report.skipped = 1;
        report.rule_hits.insert("create_alter_role".to_string(), 1);
        let mut buf = Vec::new();
        print_summary(&report, &mut buf, false).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("--- Rewrite Summary ---"));
        assert!(out.contains("Lines skipped: 1"));
        assert!(out.contains("create_alter_role"));
    }

    #[test]
    fn test_summary_without_hits() {
        let mut buf = Vec::new();
        print_summary(&RunReport::new(), &mut buf, false).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("No rules matched."));
    }
}
