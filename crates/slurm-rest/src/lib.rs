//! slurmrestd API Types
//!
//! Typed vocabulary for the scheduler's REST API: resource namespaces,
//! endpoint paths, job records with their tagged numeric fields, and the
//! response envelopes returned by the job and association queries.

pub mod error;
pub mod record;
pub mod resource;
pub mod response;

pub use error::{ApiError, DecodeError};
pub use record::{FieldValue, JobRecord, TaggedValue};
pub use resource::{api_url, Endpoint, Resource};
pub use response::{Association, AssociationsResponse, JobsResponse, UserQos};

/// API version segment used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v0.0.40";

/// Header carrying the JWT on every request.
pub const TOKEN_HEADER: &str = "X-SLURM-USER-TOKEN";
