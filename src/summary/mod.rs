//! Suite summary and stable exit codes
//!
//! Implements suite_summary.json and the process exit status.

mod exit;
mod suite_summary;

pub use exit::{ExitCode, ExitCodeAggregator};
pub use suite_summary::{SuiteSummary, SUITE_SUMMARY_SCHEMA_ID, SUITE_SUMMARY_SCHEMA_VERSION};
