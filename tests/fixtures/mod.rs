//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sbatch_verify::config::{EffectiveConfig, Settings};
use sbatch_verify::mock::MockCluster;
use sbatch_verify::token;
use sbatch_verify::Verifier;

/// Path to the sample policy suite
pub fn policy_suite_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/policy_suite.toml")
}

/// Settings from builtin defaults only
pub fn default_settings() -> Settings {
    EffectiveConfig::build(None, None, None)
        .expect("builtin config is valid")
        .settings()
        .cloned()
        .expect("typed settings present")
}

/// Cluster with `general` and `debug` partitions and no default
pub fn cluster() -> MockCluster {
    MockCluster::new(["general", "debug"]).with_user("tester")
}

/// Verifier wired to `cluster` for both submission and queries, with the
/// token obtained through the configured token command.
pub fn verifier<'a>(settings: &Settings, cluster: &'a MockCluster) -> Verifier<&'a MockCluster, &'a MockCluster> {
    let (token, _) = token::acquire_with(&settings.token, &cluster, |_| None).expect("token from cluster");
    Verifier::from_settings(settings, token, cluster, cluster, Some("tester"))
}
