//! HTTP transport seam
//!
//! - `HttpTransport`: one blocking GET, returning status and body text
//! - `UreqTransport`: production transport over `ureq`

use std::io;

/// Raw HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("failed to read response body: {0}")]
    Body(#[from] io::Error),
}

/// Performs a single GET with the given headers.
///
/// Non-2xx replies are returned as replies, not errors: slurmrestd
/// explains failures in the JSON body.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        (**self).get(url, headers)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        let mut request = self.agent.get(url).set("Accept", "application/json");
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => {
                return Err(TransportError::Request {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
            }
        };

        let status = response.status();
        let body = response.into_string()?;
        Ok(HttpReply { status, body })
    }
}
