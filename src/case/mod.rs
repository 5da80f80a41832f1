//! Verification cases
//!
//! A case submits one job and either compares the rejection message
//! exactly, or fetches the accepted job's record and checks it against
//! field expectations plus the shared post-checks.

mod suite;

pub use suite::{Suite, SuiteError, NO_PARTITION_MESSAGE};

use std::fmt;
use std::time::Instant;

use sbatch_expect::{common_checks, verify, Discrepancy, ExpectationSet};
use serde::Serialize;

use crate::config::{CheckSettings, Settings};
use crate::query::{HttpTransport, JobQueryClient, QueryError};
use crate::submit::{CommandRunner, JobSubmitter, SubmissionOutcome, SubmitCommand, SubmitError};
use crate::token::Token;

/// Record field holding the notification address.
pub const MAIL_USER_FIELD: &str = "mail_user";

/// What a case expects from the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseExpectation {
    /// Submission must fail with exactly this message.
    Rejected { message: String },
    /// Submission must succeed and the record must satisfy `fields`.
    Accepted {
        fields: ExpectationSet,
        common_checks: bool,
    },
}

/// One submit, query and assert sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationCase {
    pub name: String,
    pub params: String,
    pub expect: CaseExpectation,
}

impl VerificationCase {
    pub fn expect_rejection(name: impl Into<String>, params: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            expect: CaseExpectation::Rejected {
                message: message.into(),
            },
        }
    }

    /// Accepted case with the shared post-checks enabled.
    pub fn expect_accepted(name: impl Into<String>, params: impl Into<String>, fields: ExpectationSet) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            expect: CaseExpectation::Accepted {
                fields,
                common_checks: true,
            },
        }
    }

    pub fn without_common_checks(mut self) -> Self {
        if let CaseExpectation::Accepted { common_checks, .. } = &mut self.expect {
            *common_checks = false;
        }
        self
    }
}

/// Case status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    /// The scheduler's behavior contradicted the expectation.
    Failed,
    /// The case could not reach a verdict.
    Errored,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CaseStatus::Passed => "PASS",
            CaseStatus::Failed => "FAIL",
            CaseStatus::Errored => "ERROR",
        };
        f.write_str(label)
    }
}

/// One reason a case failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseFailure {
    UnexpectedRejection { message: String, full_output: Vec<String> },
    UnexpectedAcceptance { job_id: u64 },
    MessageMismatch { expected: String, actual: String },
    Field { discrepancy: Discrepancy },
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseFailure::UnexpectedRejection { message, .. } => {
                write!(f, "expected acceptance, submission was rejected: {}", message)
            }
            CaseFailure::UnexpectedAcceptance { job_id } => {
                write!(f, "expected rejection, job {} was accepted", job_id)
            }
            CaseFailure::MessageMismatch { expected, actual } => {
                write!(f, "rejection message mismatch: expected {:?}, got {:?}", expected, actual)
            }
            CaseFailure::Field { discrepancy } => write!(f, "{}", discrepancy),
        }
    }
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub params: String,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CaseFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl CaseReport {
    fn verdict(case: &VerificationCase, job_id: Option<u64>, failures: Vec<CaseFailure>, started: Instant) -> Self {
        let status = if failures.is_empty() {
            CaseStatus::Passed
        } else {
            CaseStatus::Failed
        };
        Self {
            name: case.name.clone(),
            params: case.params.clone(),
            status,
            job_id,
            failures,
            error: None,
            duration_ms: elapsed_ms(started),
        }
    }

    fn errored(case: &VerificationCase, error: &CaseError, started: Instant) -> Self {
        Self {
            name: case.name.clone(),
            params: case.params.clone(),
            status: CaseStatus::Errored,
            job_id: error.job_id(),
            failures: Vec::new(),
            error: Some(error.to_string()),
            duration_ms: elapsed_ms(started),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Errors that stop a case before it reaches a verdict.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The job was accepted but its record could not be read back.
    #[error("{source}")]
    Query {
        job_id: u64,
        #[source]
        source: QueryError,
    },
}

impl CaseError {
    /// The scheduler-assigned id, when submission got that far.
    pub fn job_id(&self) -> Option<u64> {
        match self {
            CaseError::Submit(_) => None,
            CaseError::Query { job_id, .. } => Some(*job_id),
        }
    }
}

/// Post-checks applied to every accepted record whose case keeps
/// `common_checks` on.
///
/// `user` is the submitting user; the mail check is skipped without one.
pub fn post_checks(settings: &CheckSettings, user: Option<&str>) -> ExpectationSet {
    let mut checks = if settings.common {
        common_checks()
    } else {
        ExpectationSet::new()
    };
    if let (Some(domain), Some(user)) = (settings.mail_domain.as_deref(), user) {
        checks.insert(MAIL_USER_FIELD, format!("{}@{}", user, domain));
    }
    checks
}

/// Drives cases through a submitter and a query client.
pub struct Verifier<R, T> {
    submitter: JobSubmitter<R>,
    client: JobQueryClient<T>,
    post_checks: ExpectationSet,
}

impl<R: CommandRunner, T: HttpTransport> Verifier<R, T> {
    pub fn new(submitter: JobSubmitter<R>, client: JobQueryClient<T>) -> Self {
        Self {
            submitter,
            client,
            post_checks: common_checks(),
        }
    }

    /// Wire a verifier from resolved settings. `user` feeds the mail check.
    pub fn from_settings(settings: &Settings, token: Token, runner: R, transport: T, user: Option<&str>) -> Self {
        let submitter = JobSubmitter::new(SubmitCommand::from_settings(&settings.submit), runner);
        let client = JobQueryClient::new(&settings.controller, token, transport);
        Self::new(submitter, client).with_post_checks(post_checks(&settings.checks, user))
    }

    pub fn with_post_checks(mut self, post_checks: ExpectationSet) -> Self {
        self.post_checks = post_checks;
        self
    }

    pub fn client(&self) -> &JobQueryClient<T> {
        &self.client
    }

    /// Run one case. Submission and query errors propagate unchanged.
    pub fn run_case(&self, case: &VerificationCase) -> Result<CaseReport, CaseError> {
        let started = Instant::now();
        tracing::info!(case = %case.name, params = %case.params, "running case");

        let outcome = self.submitter.submit(&case.params)?;
        let report = match (outcome, &case.expect) {
            (SubmissionOutcome::Rejected { message, .. }, CaseExpectation::Rejected { message: expected }) => {
                let failures = if &message == expected {
                    Vec::new()
                } else {
                    vec![CaseFailure::MessageMismatch {
                        expected: expected.clone(),
                        actual: message,
                    }]
                };
                CaseReport::verdict(case, None, failures, started)
            }
            (SubmissionOutcome::Rejected { message, full_output }, CaseExpectation::Accepted { .. }) => {
                let failure = CaseFailure::UnexpectedRejection { message, full_output };
                CaseReport::verdict(case, None, vec![failure], started)
            }
            (SubmissionOutcome::Accepted { job_id }, CaseExpectation::Rejected { .. }) => {
                let failure = CaseFailure::UnexpectedAcceptance { job_id };
                CaseReport::verdict(case, Some(job_id), vec![failure], started)
            }
            (
                SubmissionOutcome::Accepted { job_id },
                CaseExpectation::Accepted {
                    fields,
                    common_checks,
                },
            ) => {
                let record = self
                    .client
                    .query_job(job_id)
                    .map_err(|source| CaseError::Query { job_id, source })?;
                let mut discrepancies = verify(fields, &record);
                if *common_checks {
                    discrepancies.extend(verify(&self.post_checks, &record));
                }
                let failures = discrepancies
                    .into_iter()
                    .map(|discrepancy| CaseFailure::Field { discrepancy })
                    .collect();
                CaseReport::verdict(case, Some(job_id), failures, started)
            }
        };

        tracing::info!(case = %case.name, status = %report.status, "case finished");
        Ok(report)
    }

    /// Run cases in order. An error ends that case as `Errored` and the
    /// run continues; `fail_fast` stops after the first case that did
    /// not pass.
    pub fn run_suite<'a, I>(&self, cases: I, fail_fast: bool) -> Vec<CaseReport>
    where
        I: IntoIterator<Item = &'a VerificationCase>,
    {
        let mut reports = Vec::new();
        for case in cases {
            let started = Instant::now();
            let report = self.run_case(case).unwrap_or_else(|error| {
                tracing::warn!(case = %case.name, %error, "case errored");
                CaseReport::errored(case, &error, started)
            });
            let stop = fail_fast && !report.passed();
            reports.push(report);
            if stop {
                tracing::info!("stopping after first unsuccessful case");
                break;
            }
        }
        reports
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
