//! Response envelopes for the job and association queries.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, DecodeError};
use crate::record::JobRecord;

/// Body of `GET slurm/{version}/job/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobRecord>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(default)]
    pub warnings: Vec<Value>,
}

impl JobsResponse {
    /// Decode a parsed body, requiring the `jobs` array.
    pub fn from_value(body: &Value) -> Result<Self, DecodeError> {
        if !body.get("jobs").map_or(false, Value::is_array) {
            return Err(DecodeError::MissingArray("jobs"));
        }
        Ok(Self::deserialize(body)?)
    }

    /// First record, if any.
    pub fn first_job(&self) -> Option<&JobRecord> {
        self.jobs.first()
    }

    /// Description of the first reported error.
    pub fn first_error(&self) -> Option<&str> {
        first_description(&self.errors)
    }
}

/// One association from the accounting database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    /// QOS names the association may use.
    #[serde(default, deserialize_with = "qos_list")]
    pub qos: Vec<String>,
    #[serde(default)]
    pub default: AssociationDefaults,
}

/// The `default` block of an association.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssociationDefaults {
    #[serde(default)]
    pub qos: String,
}

/// Body of `GET slurmdb/{version}/associations?user={user}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationsResponse {
    pub associations: Vec<Association>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

impl AssociationsResponse {
    /// Decode a parsed body, requiring the `associations` array.
    pub fn from_value(body: &Value) -> Result<Self, DecodeError> {
        if !body.get("associations").map_or(false, Value::is_array) {
            return Err(DecodeError::MissingArray("associations"));
        }
        Ok(Self::deserialize(body)?)
    }

    /// QOS view of the first association.
    pub fn first_qos(&self) -> Option<UserQos> {
        self.associations.first().map(|a| UserQos {
            qos: a.qos.clone(),
            default_qos: a.default.qos.clone(),
        })
    }

    pub fn first_error(&self) -> Option<&str> {
        first_description(&self.errors)
    }
}

/// A user's permitted QOS list and their default QOS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQos {
    pub qos: Vec<String>,
    pub default_qos: String,
}

fn first_description(errors: &[ApiError]) -> Option<&str> {
    errors
        .first()
        .map(|e| e.description.as_str())
        .filter(|d| !d.is_empty())
}

/// Accept the QOS list either as an array or as a comma-delimited string.
fn qos_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Delimited(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(list)) => list,
        Some(Raw::Delimited(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}
