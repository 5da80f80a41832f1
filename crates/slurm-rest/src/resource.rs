//! Resource namespaces and endpoint paths.

use std::fmt;

/// Top-level API namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Controller-side state (`slurmctld`): jobs, nodes, partitions.
    Slurm,
    /// Accounting database (`slurmdbd`): associations, QOS.
    Slurmdb,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Slurm => "slurm",
            Resource::Slurmdb => "slurmdb",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An endpoint this harness queries, with the namespace it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `slurm/{version}/job/{id}`
    Job(u64),
    /// `slurmdb/{version}/associations?user={user}`
    Associations { user: String },
}

impl Endpoint {
    /// Namespace the endpoint is served from.
    pub fn resource(&self) -> Resource {
        match self {
            Endpoint::Job(_) => Resource::Slurm,
            Endpoint::Associations { .. } => Resource::Slurmdb,
        }
    }

    /// Path below the version segment, including any query string.
    ///
    /// Query values are form-encoded.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Job(id) => format!("job/{}", id),
            Endpoint::Associations { user } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("user", user)
                    .finish();
                format!("associations?{}", query)
            }
        }
    }
}

/// Build `{controller}/{resource}/{version}/{endpoint}`.
///
/// A trailing slash on the controller address is tolerated.
pub fn api_url(controller: &str, resource: Resource, version: &str, endpoint: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        controller.trim_end_matches('/'),
        resource,
        version,
        endpoint
    )
}
