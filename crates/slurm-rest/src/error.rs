//! Error types for API envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the `errors` array carried by every slurmrestd response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable explanation, e.g. "Unable to query JobId=42".
    #[serde(default)]
    pub description: String,
    /// Numeric Slurm error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_number: Option<i64>,
    /// Short error string matching `error_number`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Internal call site that raised the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ApiError {
    /// Create an error entry with only a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_number {
            Some(code) => write!(f, "{} (error {})", self.description, code),
            None => write!(f, "{}", self.description),
        }
    }
}

impl std::error::Error for ApiError {}

/// Failure to decode a response body into one of the typed envelopes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no '{0}' array")]
    MissingArray(&'static str),
}
