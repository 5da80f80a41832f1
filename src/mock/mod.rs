//! Mock scheduler implementations for testing
//!
//! - `MockRunner`: replays canned command output and records every argv
//! - `MockHttp`: serves canned replies by exact URL and records requests
//! - `MockCluster`: accepts or rejects submissions by partition and serves
//!   the resulting job records, playing both sides of a verification case

mod cluster;
mod http;
mod runner;

pub use cluster::MockCluster;
pub use http::{MockHttp, RecordedRequest};
pub use runner::MockRunner;
