//! Job submission
//!
//! Runs the submission tool once and classifies the result as accepted
//! (with a job id) or rejected (with the tool's diagnostics). A non-zero
//! exit is an outcome, never an error.

mod command;
mod runner;

pub use command::{split_command_line, SubmitCommand};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

use regex_lite::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Accepted {
        job_id: u64,
    },
    Rejected {
        /// Last non-empty diagnostic line; the scheduler puts the
        /// authoritative error there.
        message: String,
        /// Every diagnostic line, in order.
        full_output: Vec<String>,
    },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }

    pub fn job_id(&self) -> Option<u64> {
        match self {
            SubmissionOutcome::Accepted { job_id } => Some(*job_id),
            SubmissionOutcome::Rejected { .. } => None,
        }
    }

    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Rejected { message, .. } => Some(message),
            SubmissionOutcome::Accepted { .. } => None,
        }
    }

    /// Build a rejection from diagnostic text.
    ///
    /// `fallback` becomes the message when the text has no non-empty line.
    pub fn rejected_from_text(text: &str, fallback: impl Into<String>) -> Self {
        let full_output: Vec<String> = text.lines().map(str::to_string).collect();
        let message = full_output
            .iter()
            .rev()
            .map(|line| line.trim_end())
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.into());
        SubmissionOutcome::Rejected {
            message,
            full_output,
        }
    }
}

/// Submission errors that are not a scheduler verdict.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The tool exited 0 with output but no "Submitted batch job N" line.
    #[error("submission output has no job id: {}", lines.join(" | "))]
    UnrecognizedOutput { lines: Vec<String> },
}

fn job_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Submitted batch job (\d+)").expect("job id pattern is valid"))
}

/// Job id from the first "Submitted batch job N" line.
pub fn parse_job_id(stdout: &str) -> Option<u64> {
    let pattern = job_id_pattern();
    stdout.lines().find_map(|line| {
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .filter(|id| *id > 0)
    })
}

/// Submits jobs through a [`CommandRunner`].
pub struct JobSubmitter<R> {
    command: SubmitCommand,
    runner: R,
}

impl<R: CommandRunner> JobSubmitter<R> {
    pub fn new(command: SubmitCommand, runner: R) -> Self {
        Self { command, runner }
    }

    /// Submit one job with caller parameters appended to the fixed prefix.
    pub fn submit(&self, params: &str) -> Result<SubmissionOutcome, SubmitError> {
        let line = self.command.command_line(params);
        tracing::debug!(command = %line, "submitting job");

        let argv = match split_command_line(&line) {
            Ok(argv) => argv,
            Err(reason) => {
                tracing::warn!(%reason, "submission command line did not tokenize");
                return Ok(SubmissionOutcome::Rejected {
                    message: reason.clone(),
                    full_output: vec![reason],
                });
            }
        };

        let output = match self.runner.run(&argv) {
            Ok(output) => output,
            Err(e) => {
                let text = e.to_string();
                tracing::warn!(error = %text, "submission tool could not be run");
                return Ok(SubmissionOutcome::Rejected {
                    message: text.clone(),
                    full_output: vec![text],
                });
            }
        };

        if !output.success() || output.stdout.trim().is_empty() {
            tracing::debug!(status = %output.status_label(), "submission rejected");
            let fallback = format!(
                "{} exited with status {} and printed no diagnostics",
                self.command.tool,
                output.status_label()
            );
            return Ok(SubmissionOutcome::rejected_from_text(&output.stderr, fallback));
        }

        match parse_job_id(&output.stdout) {
            Some(job_id) => {
                tracing::debug!(job_id, "submission accepted");
                Ok(SubmissionOutcome::Accepted { job_id })
            }
            None => {
                tracing::warn!("submission succeeded but printed no job id");
                Err(SubmitError::UnrecognizedOutput {
                    lines: output.stdout.lines().map(str::to_string).collect(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;

    fn submitter(runner: &MockRunner) -> JobSubmitter<&MockRunner> {
        let command = SubmitCommand {
            tool: "sbatch".to_string(),
            begin: "--begin=now+1second".to_string(),
            wrap: "--wrap=\"sleep 1\"".to_string(),
            extra_flags: "-A root".to_string(),
        };
        JobSubmitter::new(command, runner)
    }

    #[test]
    fn test_parse_job_id_first_match_wins() {
        let stdout = "note: something\nSubmitted batch job 41\nSubmitted batch job 99\n";
        assert_eq!(parse_job_id(stdout), Some(41));
    }

    #[test]
    fn test_parse_job_id_none() {
        assert_eq!(parse_job_id("queued\n"), None);
        assert_eq!(parse_job_id("Submitted batch job 0\n"), None);
    }

    #[test]
    fn test_accepted() {
        let runner = MockRunner::new();
        runner.push_accepted(1234);

        let outcome = submitter(&runner).submit("-p general").unwrap();
        assert_eq!(outcome, SubmissionOutcome::Accepted { job_id: 1234 });

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "sbatch");
        assert_eq!(calls[0][2], "--wrap=sleep 1");
        assert_eq!(&calls[0][calls[0].len() - 2..], ["-p", "general"]);
    }

    #[test]
    fn test_rejected_uses_last_non_empty_line() {
        let runner = MockRunner::new();
        runner.push_output(
            1,
            "",
            "sbatch: warning: first\nsbatch: error: Batch job submission failed: Invalid account\n\n",
        );

        let outcome = submitter(&runner).submit("-A nobody").unwrap();
        match outcome {
            SubmissionOutcome::Rejected {
                message,
                full_output,
            } => {
                assert_eq!(message, "sbatch: error: Batch job submission failed: Invalid account");
                assert_eq!(
                    full_output,
                    vec![
                        "sbatch: warning: first",
                        "sbatch: error: Batch job submission failed: Invalid account",
                        "",
                    ]
                );
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_exit_with_empty_stdout_is_rejection() {
        let runner = MockRunner::new();
        runner.push_output(0, "", "sbatch: error: something odd\n");

        let outcome = submitter(&runner).submit("").unwrap();
        assert_eq!(outcome.rejection_message(), Some("sbatch: error: something odd"));
    }

    #[test]
    fn test_rejection_without_diagnostics_uses_fallback() {
        let runner = MockRunner::new();
        runner.push_output(2, "", "");

        let outcome = submitter(&runner).submit("").unwrap();
        assert_eq!(
            outcome.rejection_message(),
            Some("sbatch exited with status 2 and printed no diagnostics")
        );
    }

    #[test]
    fn test_spawn_failure_folded_into_rejection() {
        let runner = MockRunner::new();
        runner.push_spawn_error("failed to run sbatch: No such file or directory");

        let outcome = submitter(&runner).submit("-p general").unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::Rejected {
                message: "failed to run sbatch: No such file or directory".to_string(),
                full_output: vec!["failed to run sbatch: No such file or directory".to_string()],
            }
        );
    }

    #[test]
    fn test_malformed_params_rejected_without_spawn() {
        let runner = MockRunner::new();

        let outcome = submitter(&runner).submit("--comment=\"unterminated").unwrap();
        assert!(!outcome.is_accepted());
        assert!(outcome.rejection_message().unwrap().contains("unbalanced"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_unrecognized_success_output() {
        let runner = MockRunner::new();
        runner.push_output(0, "job queued somewhere\n", "");

        let err = submitter(&runner).submit("-p general").unwrap_err();
        match err {
            SubmitError::UnrecognizedOutput { lines } => {
                assert_eq!(lines, vec!["job queued somewhere"]);
            }
        }
    }
}
