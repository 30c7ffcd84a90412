//! Console presentation: status messages and run summaries.

pub mod output_format;
pub mod run_summary;
