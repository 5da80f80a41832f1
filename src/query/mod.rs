//! Job record queries against slurmrestd
//!
//! One GET per call, no retries, no caching. Errors reported by the API
//! surface with the API's own wording.

mod transport;

pub use transport::{HttpReply, HttpTransport, TransportError, UreqTransport};

use serde_json::Value;
use slurm_rest::{api_url, AssociationsResponse, DecodeError, Endpoint, JobRecord, JobsResponse, Resource, UserQos};

use crate::config::ControllerSettings;
use crate::token::Token;

/// Decoded body plus HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

/// Query errors
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The API returned no matching record. The message is the API's own
    /// `errors[0].description` when it gave one.
    #[error("{0}")]
    RecordNotFound(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid response from {url} (HTTP {status}): {source}")]
    Decode {
        url: String,
        status: u16,
        #[source]
        source: DecodeError,
    },
}

/// Client for the job and association endpoints.
pub struct JobQueryClient<T> {
    controller: String,
    api_version: String,
    auth_header: String,
    token: Token,
    transport: T,
}

impl<T: HttpTransport> JobQueryClient<T> {
    pub fn new(settings: &ControllerSettings, token: Token, transport: T) -> Self {
        Self {
            controller: settings.url.clone(),
            api_version: settings.api_version.clone(),
            auth_header: settings.auth_header.clone(),
            token,
            transport,
        }
    }

    /// Full URL for an endpoint path under a resource namespace.
    pub fn url(&self, resource: Resource, endpoint: &str) -> String {
        api_url(&self.controller, resource, &self.api_version, endpoint)
    }

    /// GET `{controller}/{resource}/{version}/{endpoint}` and decode JSON.
    pub fn probe(&self, resource: Resource, endpoint: &str) -> Result<ApiReply, QueryError> {
        let url = self.url(resource, endpoint);
        tracing::debug!(%url, "querying slurmrestd");

        let reply = self
            .transport
            .get(&url, &[(self.auth_header.as_str(), self.token.expose())])?;
        tracing::debug!(%url, status = reply.status, "slurmrestd replied");

        let body = serde_json::from_str(&reply.body).map_err(|e| QueryError::Decode {
            url: url.clone(),
            status: reply.status,
            source: DecodeError::Json(e),
        })?;

        Ok(ApiReply {
            status: reply.status,
            body,
        })
    }

    /// The scheduler's record for a job id.
    pub fn query_job(&self, job_id: u64) -> Result<JobRecord, QueryError> {
        let endpoint = Endpoint::Job(job_id);
        let reply = self.probe(endpoint.resource(), &endpoint.path())?;
        let response = JobsResponse::from_value(&reply.body)
            .map_err(|source| self.decode_error(&endpoint, reply.status, source))?;

        let message = response
            .first_error()
            .map(str::to_string)
            .unwrap_or_else(|| format!("no record returned for job {}", job_id));

        response
            .jobs
            .into_iter()
            .next()
            .ok_or(QueryError::RecordNotFound(message))
    }

    /// A user's QOS list and default QOS, from their first association.
    pub fn query_user_qos(&self, user: &str) -> Result<UserQos, QueryError> {
        let endpoint = Endpoint::Associations {
            user: user.to_string(),
        };
        let reply = self.probe(endpoint.resource(), &endpoint.path())?;
        let response = AssociationsResponse::from_value(&reply.body)
            .map_err(|source| self.decode_error(&endpoint, reply.status, source))?;

        response.first_qos().ok_or_else(|| {
            QueryError::RecordNotFound(
                response
                    .first_error()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("no associations found for user {}", user)),
            )
        })
    }

    fn decode_error(&self, endpoint: &Endpoint, status: u16, source: DecodeError) -> QueryError {
        QueryError::Decode {
            url: self.url(endpoint.resource(), &endpoint.path()),
            status,
            source,
        }
    }
}
