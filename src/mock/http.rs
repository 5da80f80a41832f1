//! Canned HTTP transport

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::query::{HttpReply, HttpTransport, TransportError};

/// One GET seen by [`MockHttp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Serves replies registered per exact URL. Unknown URLs fail like a
/// refused connection.
#[derive(Default)]
pub struct MockHttp {
    routes: Mutex<HashMap<String, HttpReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as JSON with `status` for `url`.
    pub fn route(&self, url: &str, status: u16, body: Value) {
        self.route_raw(url, status, &body.to_string());
    }

    /// Serve `body` verbatim.
    pub fn route_raw(&self, url: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            HttpReply {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for MockHttp {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        });

        self.routes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Request {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_and_record() {
        let http = MockHttp::new();
        http.route("http://h/slurm/v0.0.40/job/1", 200, json!({"jobs": []}));

        let reply = http
            .get("http://h/slurm/v0.0.40/job/1", &[("X-SLURM-USER-TOKEN", "t")])
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, r#"{"jobs":[]}"#);

        let requests = http.requests();
        assert_eq!(requests[0].url, "http://h/slurm/v0.0.40/job/1");
        assert_eq!(requests[0].headers[0].0, "X-SLURM-USER-TOKEN");
    }

    #[test]
    fn test_unknown_url() {
        let http = MockHttp::new();
        let err = http.get("http://h/nowhere", &[]).unwrap_err();
        assert!(err.to_string().contains("http://h/nowhere"));
    }
}
