//! sbatch-verify - submit-and-verify harness for Slurm admission policy
//!
//! Submits batch jobs with `sbatch`, fetches the accepted jobs' records
//! from slurmrestd, and checks them against declarative expectations.
//! Rejected submissions are checked by their exact diagnostic message.

pub mod case;
pub mod config;
pub mod mock;
pub mod query;
pub mod submit;
pub mod summary;
pub mod token;

pub use case::{CaseReport, CaseStatus, Suite, VerificationCase, Verifier};
pub use config::{EffectiveConfig, Settings};
pub use query::{JobQueryClient, QueryError, UreqTransport};
pub use submit::{JobSubmitter, ProcessRunner, SubmissionOutcome};
pub use summary::{ExitCode, SuiteSummary};
pub use token::{Token, TokenError};

pub use sbatch_expect::{Expectation, ExpectationSet, TaggedExpectation};
pub use slurm_rest::{JobRecord, TaggedValue};
