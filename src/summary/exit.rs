//! Stable exit codes

use serde::{Deserialize, Serialize};

use crate::case::CaseStatus;

/// Process exit codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Every case passed
    #[default]
    Success = 0,
    /// At least one case failed its expectations
    Failed = 1,
    /// At least one case could not reach a verdict
    Errored = 2,
    /// Configuration, token or suite loading failed before any case ran
    Setup = 3,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            1 => Some(ExitCode::Failed),
            2 => Some(ExitCode::Errored),
            3 => Some(ExitCode::Setup),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

/// Aggregates case statuses. Errored outranks failed.
#[derive(Debug, Default)]
pub struct ExitCodeAggregator {
    has_failed: bool,
    has_errored: bool,
}

impl ExitCodeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, status: CaseStatus) {
        match status {
            CaseStatus::Passed => {}
            CaseStatus::Failed => self.has_failed = true,
            CaseStatus::Errored => self.has_errored = true,
        }
    }

    pub fn status(&self) -> CaseStatus {
        if self.has_errored {
            CaseStatus::Errored
        } else if self.has_failed {
            CaseStatus::Failed
        } else {
            CaseStatus::Passed
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.status() {
            CaseStatus::Passed => ExitCode::Success,
            CaseStatus::Failed => ExitCode::Failed,
            CaseStatus::Errored => ExitCode::Errored,
        }
    }
}
