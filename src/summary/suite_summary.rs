//! Suite summary (suite_summary.json)

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::exit::ExitCodeAggregator;
use crate::case::{CaseReport, CaseStatus};

/// Schema version for suite_summary.json
pub const SUITE_SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for suite_summary.json
pub const SUITE_SUMMARY_SCHEMA_ID: &str = "sbatch-verify/suite_summary@1";

/// Suite summary
#[derive(Debug, Clone, Serialize)]
pub struct SuiteSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Run identifier
    pub run_id: String,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    /// Aggregated status
    pub status: CaseStatus,

    /// Aggregated exit code
    pub exit_code: i32,

    pub case_count: usize,
    pub cases_passed: usize,
    pub cases_failed: usize,
    pub cases_errored: usize,

    /// Wall-clock duration of the whole suite in milliseconds
    pub duration_ms: u64,

    /// Human-readable summary
    pub human_summary: String,

    /// Per-case reports, in run order
    pub cases: Vec<CaseReport>,
}

impl SuiteSummary {
    /// Aggregate case reports.
    pub fn from_reports(run_id: String, reports: Vec<CaseReport>, duration_ms: u64) -> Self {
        let mut aggregator = ExitCodeAggregator::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut errored = 0;

        for report in &reports {
            aggregator.add(report.status);
            match report.status {
                CaseStatus::Passed => passed += 1,
                CaseStatus::Failed => failed += 1,
                CaseStatus::Errored => errored += 1,
            }
        }

        let case_count = reports.len();
        let status = aggregator.status();
        let human_summary = Self::generate_human_summary(status, case_count, passed, failed, errored);

        Self {
            schema_version: SUITE_SUMMARY_SCHEMA_VERSION,
            schema_id: SUITE_SUMMARY_SCHEMA_ID.to_string(),
            run_id,
            created_at: Utc::now(),
            status,
            exit_code: aggregator.exit_code().as_i32(),
            case_count,
            cases_passed: passed,
            cases_failed: failed,
            cases_errored: errored,
            duration_ms,
            human_summary,
            cases: reports,
        }
    }

    /// New summary with a fresh v4 run id.
    pub fn new_run(reports: Vec<CaseReport>, duration_ms: u64) -> Self {
        Self::from_reports(uuid::Uuid::new_v4().to_string(), reports, duration_ms)
    }

    fn generate_human_summary(
        status: CaseStatus,
        case_count: usize,
        passed: usize,
        failed: usize,
        errored: usize,
    ) -> String {
        if case_count == 0 {
            return "No cases executed".to_string();
        }
        match status {
            CaseStatus::Passed => format!("Suite passed: {}/{} cases passed", passed, case_count),
            CaseStatus::Failed | CaseStatus::Errored => format!(
                "Suite failed: {} passed, {} failed, {} errored",
                passed, failed, errored
            ),
        }
    }

    /// Plain-text report: one line per case, failures indented beneath.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for case in &self.cases {
            out.push_str(&format!("{:<5} {}", case.status.to_string(), case.name));
            if let Some(job_id) = case.job_id {
                out.push_str(&format!(" (job {})", job_id));
            }
            out.push('\n');
            for failure in &case.failures {
                out.push_str(&format!("      {}\n", failure));
            }
            if let Some(error) = &case.error {
                out.push_str(&format!("      {}\n", error));
            }
        }
        out.push_str(&self.human_summary);
        out.push('\n');
        out
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))?;
        fs::write(path, json)
    }
}
