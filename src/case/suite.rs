//! Verification suites
//!
//! A suite file lists cases as `[[case]]` tables:
//!
//! ```toml
//! [[case]]
//! name = "no_partition"
//! params = ""
//! reject = "sbatch: error: Batch job submission failed: No partition specified or system default partition"
//!
//! [[case]]
//! name = "general"
//! params = "-p general"
//! [case.expect]
//! partition = "general"
//! cpus = { set = true, infinite = false, at_least = 1 }
//! features = ["gpu", "fast"]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sbatch_expect::{ExpectationSet, TaggedExpectation, CPUS_FIELD, TIME_LIMIT_FIELD};
use serde::Deserialize;

use super::{CaseExpectation, VerificationCase};

/// Rejection printed by `sbatch` when no partition is given and the
/// cluster has no default.
pub const NO_PARTITION_MESSAGE: &str =
    "sbatch: error: Batch job submission failed: No partition specified or system default partition";

#[derive(Debug, Deserialize)]
struct SuiteFile {
    #[serde(default, rename = "case")]
    cases: Vec<CaseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseEntry {
    name: String,
    #[serde(default)]
    params: String,
    reject: Option<String>,
    expect: Option<ExpectationSet>,
    #[serde(default = "default_true")]
    common_checks: bool,
}

fn default_true() -> bool {
    true
}

/// Errors that can occur when loading a suite
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("Failed to read suite file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse suite TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Suite file not found: {0}")]
    NotFound(PathBuf),

    #[error("Duplicate case name: '{0}'")]
    DuplicateName(String),

    #[error("Case '{name}': {reason}")]
    InvalidCase { name: String, reason: String },

    #[error("Suite has no cases")]
    Empty,
}

/// An ordered list of verification cases.
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    cases: Vec<VerificationCase>,
}

impl Suite {
    /// Load a suite from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        if !path.exists() {
            return Err(SuiteError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a suite from a TOML string.
    pub fn parse(content: &str) -> Result<Self, SuiteError> {
        let file: SuiteFile = toml::from_str(content)?;
        if file.cases.is_empty() {
            return Err(SuiteError::Empty);
        }

        let mut seen = HashSet::new();
        let mut cases = Vec::with_capacity(file.cases.len());
        for entry in file.cases {
            if !seen.insert(entry.name.clone()) {
                return Err(SuiteError::DuplicateName(entry.name));
            }
            cases.push(entry.into_case()?);
        }

        Ok(Self { cases })
    }

    /// The default suite: a submission without a partition is rejected
    /// with the scheduler's exact message, and one on `general` is
    /// accepted with positive, bounded CPU and time limits.
    pub fn builtin() -> Self {
        let positive = TaggedExpectation::configured().at_least(1.0);
        Self {
            cases: vec![
                VerificationCase::expect_rejection("no_partition_rejected", "", NO_PARTITION_MESSAGE),
                VerificationCase::expect_accepted(
                    "general_partition_accepted",
                    "-p general",
                    ExpectationSet::new()
                        .field(CPUS_FIELD, positive.clone())
                        .field(TIME_LIMIT_FIELD, positive),
                ),
            ],
        }
    }

    pub fn cases(&self) -> &[VerificationCase] {
        &self.cases
    }

    pub fn get(&self, name: &str) -> Option<&VerificationCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl CaseEntry {
    fn into_case(self) -> Result<VerificationCase, SuiteError> {
        if self.name.trim().is_empty() {
            return Err(SuiteError::InvalidCase {
                name: "(unnamed)".to_string(),
                reason: "name must not be empty".to_string(),
            });
        }

        let expect = match (self.reject, self.expect) {
            (Some(_), Some(_)) => {
                return Err(SuiteError::InvalidCase {
                    name: self.name,
                    reason: "'reject' and 'expect' are mutually exclusive".to_string(),
                })
            }
            (Some(message), None) => {
                if message.is_empty() {
                    return Err(SuiteError::InvalidCase {
                        name: self.name,
                        reason: "'reject' message must not be empty".to_string(),
                    });
                }
                CaseExpectation::Rejected { message }
            }
            (None, fields) => CaseExpectation::Accepted {
                fields: fields.unwrap_or_default(),
                common_checks: self.common_checks,
            },
        };

        Ok(VerificationCase {
            name: self.name,
            params: self.params,
            expect,
        })
    }
}
