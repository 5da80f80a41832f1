//! In-memory scheduler double
//!
//! Answers `sbatch`, `scontrol token` and the job/association endpoints
//! from one shared state, so a whole case runs without a cluster.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::case::NO_PARTITION_MESSAGE;
use crate::query::{HttpReply, HttpTransport, TransportError};
use crate::submit::{CommandOutput, CommandRunner};

const INVALID_PARTITION_ERROR: &str = "sbatch: error: Batch job submission failed: Invalid partition name specified";

const DEFAULT_TIME_LIMIT_MINUTES: u64 = 60;

#[derive(Default)]
struct ClusterState {
    next_job_id: u64,
    jobs: BTreeMap<u64, Value>,
    submissions: Vec<Vec<String>>,
}

/// Scheduler double with a fixed partition list and token.
pub struct MockCluster {
    partitions: Vec<String>,
    default_partition: Option<String>,
    token: String,
    user: String,
    qos: HashMap<String, (Vec<String>, String)>,
    state: Mutex<ClusterState>,
}

impl MockCluster {
    /// A cluster with the given partitions, no default partition, and
    /// job ids starting at 1000.
    pub fn new<I, S>(partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            partitions: partitions.into_iter().map(Into::into).collect(),
            default_partition: None,
            token: "mock-jwt".to_string(),
            user: "tester".to_string(),
            qos: HashMap::new(),
            state: Mutex::new(ClusterState {
                next_job_id: 1000,
                ..ClusterState::default()
            }),
        }
    }

    pub fn with_default_partition(mut self, partition: impl Into<String>) -> Self {
        self.default_partition = Some(partition.into());
        self
    }

    /// Token printed by `scontrol token` and required on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Submitting user, recorded as `user_name` on every job.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_qos(mut self, user: &str, qos: &[&str], default_qos: &str) -> Self {
        self.qos.insert(
            user.to_string(),
            (qos.iter().map(|q| q.to_string()).collect(), default_qos.to_string()),
        );
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Every `sbatch` argv received, oldest first.
    pub fn submissions(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// Stored record for a job, if it was accepted.
    pub fn job(&self, job_id: u64) -> Option<Value> {
        self.state.lock().unwrap().jobs.get(&job_id).cloned()
    }

    /// Overwrite one field of a stored job record.
    pub fn set_field(&self, job_id: u64, field: &str, value: Value) {
        if let Some(Value::Object(record)) = self.state.lock().unwrap().jobs.get_mut(&job_id) {
            record.insert(field.to_string(), value);
        }
    }

    fn submit(&self, args: &[String]) -> CommandOutput {
        let mut state = self.state.lock().unwrap();
        state.submissions.push(args.to_vec());

        let partition = match option_value(args, "-p", "--partition").or_else(|| self.default_partition.clone()) {
            Some(partition) => partition,
            None => return rejected(NO_PARTITION_MESSAGE),
        };
        if !self.partitions.contains(&partition) {
            return rejected(INVALID_PARTITION_ERROR);
        }

        let cpus = option_value(args, "-c", "--cpus-per-task")
            .and_then(|c| c.parse::<u64>().ok())
            .unwrap_or(1);
        let minutes = option_value(args, "-t", "--time")
            .and_then(|t| parse_minutes(&t))
            .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES);

        let job_id = state.next_job_id;
        state.next_job_id += 1;
        state.jobs.insert(
            job_id,
            json!({
                "job_id": job_id,
                "name": option_value(args, "-J", "--job-name").unwrap_or_else(|| "wrap".to_string()),
                "partition": partition,
                "account": option_value(args, "-A", "--account").unwrap_or_default(),
                "user_name": self.user,
                "mail_user": option_value(args, "--mail-user", "--mail-user").unwrap_or_else(|| self.user.clone()),
                "features": option_value(args, "-C", "--constraint").unwrap_or_default(),
                "qos": option_value(args, "-q", "--qos").unwrap_or_else(|| "normal".to_string()),
                "cpus": tagged(cpus),
                "time_limit": tagged(minutes),
            }),
        );

        CommandOutput {
            status: Some(0),
            stdout: format!("Submitted batch job {}\n", job_id),
            stderr: String::new(),
        }
    }

    fn job_reply(&self, job_id: u64) -> HttpReply {
        match self.job(job_id) {
            Some(record) => reply(200, json!({"jobs": [record], "errors": [], "warnings": []})),
            None => reply(
                500,
                json!({
                    "jobs": [],
                    "errors": [{
                        "description": format!("Unable to query JobId={}", job_id),
                        "error_number": 2017,
                        "error": "Invalid job id specified",
                        "source": "_handle_job_get"
                    }],
                    "warnings": []
                }),
            ),
        }
    }

    fn associations_reply(&self, user: &str) -> HttpReply {
        let associations: Vec<Value> = self
            .qos
            .get(user)
            .map(|(qos, default_qos)| {
                vec![json!({
                    "user": user,
                    "account": "root",
                    "qos": qos,
                    "default": {"qos": default_qos}
                })]
            })
            .unwrap_or_default();
        reply(200, json!({"associations": associations, "errors": []}))
    }
}

impl CommandRunner for MockCluster {
    fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
        match argv.first().map(String::as_str) {
            Some("sbatch") => Ok(self.submit(&argv[1..])),
            Some("scontrol") if argv.get(1).map(String::as_str) == Some("token") => Ok(CommandOutput {
                status: Some(0),
                stdout: format!("SLURM_JWT={}\n", self.token),
                stderr: String::new(),
            }),
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("failed to run {}: command not found", argv.join(" ")),
            )),
        }
    }
}

impl HttpTransport for MockCluster {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        let authorized = headers.iter().any(|(_, value)| *value == self.token);
        if !authorized {
            return Ok(reply(
                401,
                json!({"errors": [{"description": "Authentication failure", "error_number": 1007}]}),
            ));
        }

        if let Some((_, query)) = url.split_once("/associations?") {
            let user = form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "user")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default();
            return Ok(self.associations_reply(&user));
        }
        if let Some((_, id)) = url.rsplit_once("/job/") {
            if let Ok(job_id) = id.parse::<u64>() {
                return Ok(self.job_reply(job_id));
            }
        }

        Ok(reply(404, json!({"errors": [{"description": "Unable to find endpoint"}]})))
    }
}

fn rejected(message: &str) -> CommandOutput {
    CommandOutput {
        status: Some(1),
        stdout: String::new(),
        stderr: format!("{}\n", message),
    }
}

fn reply(status: u16, body: Value) -> HttpReply {
    HttpReply {
        status,
        body: body.to_string(),
    }
}

fn tagged(number: u64) -> Value {
    json!({"set": true, "infinite": false, "number": number})
}

/// Value of the last `-x v`, `-xv`, `--long v` or `--long=v` occurrence.
fn option_value(args: &[String], short: &str, long: &str) -> Option<String> {
    let mut found = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == short || arg == long {
            found = iter.next().cloned();
        } else if let Some(value) = arg.strip_prefix(long).and_then(|rest| rest.strip_prefix('=')) {
            found = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix(short).filter(|v| !v.is_empty() && !arg.starts_with("--")) {
            found = Some(value.to_string());
        }
    }
    found
}

/// Slurm time strings: `M`, `M:S` or `H:M:S`, rounded down to minutes.
fn parse_minutes(value: &str) -> Option<u64> {
    let parts: Vec<u64> = value
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [m] | [m, _] => Some(*m),
        [h, m, _] => Some(h * 60 + m),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_option_value_forms() {
        let args = argv(&["-p", "a", "--partition=b"]);
        assert_eq!(option_value(&args, "-p", "--partition"), Some("b".to_string()));
        assert_eq!(option_value(&argv(&["-pgpu"]), "-p", "--partition"), Some("gpu".to_string()));
        assert_eq!(option_value(&argv(&["--partition", "c"]), "-p", "--partition"), Some("c".to_string()));
        assert_eq!(option_value(&argv(&["--parsable"]), "-p", "--partition"), None);
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("30"), Some(30));
        assert_eq!(parse_minutes("30:15"), Some(30));
        assert_eq!(parse_minutes("2:05:00"), Some(125));
        assert_eq!(parse_minutes("soon"), None);
    }

    #[test]
    fn test_submit_without_partition_rejected() {
        let cluster = MockCluster::new(["general"]);
        let out = cluster.run(&argv(&["sbatch", "--wrap=sleep 1"])).unwrap();
        assert_eq!(out.status, Some(1));
        assert_eq!(out.stderr.trim_end(), NO_PARTITION_MESSAGE);
    }

    #[test]
    fn test_default_partition_accepts() {
        let cluster = MockCluster::new(["general"]).with_default_partition("general");
        let out = cluster.run(&argv(&["sbatch", "--wrap=sleep 1"])).unwrap();
        assert_eq!(out.stdout, "Submitted batch job 1000\n");
        assert_eq!(cluster.job(1000).unwrap()["partition"], "general");
    }

    #[test]
    fn test_submit_records_job() {
        let cluster = MockCluster::new(["general"]);
        let out = cluster
            .run(&argv(&["sbatch", "-A", "root", "-p", "general", "-c", "4", "-t", "1:00:00"]))
            .unwrap();
        assert!(out.success());

        let job = cluster.job(1000).unwrap();
        assert_eq!(job["account"], "root");
        assert_eq!(job["cpus"]["number"], 4);
        assert_eq!(job["time_limit"]["number"], 60);
        assert_eq!(cluster.submissions().len(), 1);
    }

    #[test]
    fn test_unknown_partition_rejected() {
        let cluster = MockCluster::new(["general"]);
        let out = cluster.run(&argv(&["sbatch", "-p", "nope"])).unwrap();
        assert!(out.stderr.contains("Invalid partition name"));
    }

    #[test]
    fn test_token_command() {
        let cluster = MockCluster::new(["general"]).with_token("abc");
        let out = cluster.run(&argv(&["scontrol", "token"])).unwrap();
        assert_eq!(out.stdout, "SLURM_JWT=abc\n");
    }

    #[test]
    fn test_requests_require_token() {
        let cluster = MockCluster::new(["general"]);
        let reply = cluster.get("http://h/slurm/v0.0.40/job/1000", &[]).unwrap();
        assert_eq!(reply.status, 401);
    }

    #[test]
    fn test_unknown_job_reply() {
        let cluster = MockCluster::new(["general"]);
        let reply = cluster
            .get("http://h/slurm/v0.0.40/job/77", &[("X-SLURM-USER-TOKEN", "mock-jwt")])
            .unwrap();
        assert_eq!(reply.status, 500);
        assert!(reply.body.contains("Unable to query JobId=77"));
    }

    #[test]
    fn test_associations_user_decoded() {
        let cluster = MockCluster::new(["general"]).with_qos("a b", &["normal"], "normal");
        let reply = cluster
            .get(
                "http://h/slurmdb/v0.0.40/associations?user=a+b",
                &[("X-SLURM-USER-TOKEN", "mock-jwt")],
            )
            .unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("\"user\":\"a b\""));
    }
}
