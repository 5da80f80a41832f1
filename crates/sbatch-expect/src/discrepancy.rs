//! Per-field discrepancy reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Machine-readable reason a field failed its expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum DiscrepancyKind {
    /// Field absent from the record.
    #[serde(rename = "MISSING_FIELD")]
    MissingField,

    /// Exact comparison failed.
    #[serde(rename = "VALUE_MISMATCH")]
    ValueMismatch { expected: Value, actual: Value },

    /// A tagged value's `set` or `infinite` flag differs.
    #[serde(rename = "FLAG_MISMATCH")]
    FlagMismatch {
        flag: String,
        expected: bool,
        actual: bool,
    },

    /// A tagged value's magnitude is below the required minimum.
    #[serde(rename = "BELOW_MINIMUM")]
    BelowMinimum { minimum: f64, actual: Value },

    /// Delimited field splits into a different number of tokens.
    #[serde(rename = "TOKEN_COUNT_MISMATCH")]
    TokenCountMismatch { expected: usize, actual: usize },

    /// Expected token not found in the delimited field.
    #[serde(rename = "MISSING_TOKEN")]
    MissingToken { token: String, actual: String },

    /// The recorded value cannot be compared under the expected rule.
    #[serde(rename = "SHAPE_MISMATCH")]
    ShapeMismatch { expected: String, actual: String },
}

impl DiscrepancyKind {
    /// Compact code, e.g. `FLAG_MISMATCH:set`.
    pub fn to_code(&self) -> String {
        match self {
            DiscrepancyKind::MissingField => "MISSING_FIELD".to_string(),
            DiscrepancyKind::ValueMismatch { .. } => "VALUE_MISMATCH".to_string(),
            DiscrepancyKind::FlagMismatch { flag, .. } => format!("FLAG_MISMATCH:{}", flag),
            DiscrepancyKind::BelowMinimum { .. } => "BELOW_MINIMUM".to_string(),
            DiscrepancyKind::TokenCountMismatch { .. } => "TOKEN_COUNT_MISMATCH".to_string(),
            DiscrepancyKind::MissingToken { token, .. } => format!("MISSING_TOKEN:{}", token),
            DiscrepancyKind::ShapeMismatch { expected, .. } => {
                format!("SHAPE_MISMATCH:{}", expected)
            }
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscrepancyKind::MissingField => write!(f, "field is missing"),
            DiscrepancyKind::ValueMismatch { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            DiscrepancyKind::FlagMismatch {
                flag,
                expected,
                actual,
            } => write!(f, "expected {}={}, got {}", flag, expected, actual),
            DiscrepancyKind::BelowMinimum { minimum, actual } => {
                write!(f, "expected number >= {}, got {}", minimum, actual)
            }
            DiscrepancyKind::TokenCountMismatch { expected, actual } => {
                write!(f, "expected {} values, but got {}", expected, actual)
            }
            DiscrepancyKind::MissingToken { token, actual } => {
                write!(f, "'{}' not found in '{}'", token, actual)
            }
            DiscrepancyKind::ShapeMismatch { expected, actual } => {
                write!(f, "expected a {}, got a {}", expected, actual)
            }
        }
    }
}

/// One failed expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: String,
    #[serde(flatten)]
    pub kind: DiscrepancyKind,
}

impl Discrepancy {
    pub fn new(field: impl Into<String>, kind: DiscrepancyKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}
