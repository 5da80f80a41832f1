//! Built-in defaults (layer 1)
//!
//! Values used when neither a config file nor a CLI flag sets them.

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// slurmrestd base address (default: "http://localhost:6820")
    pub controller_url: String,

    /// API version path segment (default: "v0.0.40")
    pub api_version: String,

    /// Header carrying the JWT (default: "X-SLURM-USER-TOKEN")
    pub auth_header: String,

    /// Submission tool (default: "sbatch")
    pub submit_tool: String,

    /// Begin-time directive placed before caller parameters
    pub submit_begin: String,

    /// Wrapped command directive placed before caller parameters
    pub submit_wrap: String,

    /// Site-specific flags appended after the fixed directives (default: "-A root")
    pub submit_extra_flags: String,

    /// Environment variable that supplies a ready-made token (default: "SLURM_JWT")
    pub token_env_var: String,

    /// Command that prints `NAME=token` (default: ["scontrol", "token"])
    pub token_command: Vec<String>,

    /// Apply the cpus/time_limit post-checks to every accepted job (default: true)
    pub common_checks: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            controller_url: "http://localhost:6820".to_string(),
            api_version: slurm_rest::DEFAULT_API_VERSION.to_string(),
            auth_header: slurm_rest::TOKEN_HEADER.to_string(),
            submit_tool: "sbatch".to_string(),
            submit_begin: "--begin=\"now+1second\"".to_string(),
            submit_wrap: "--wrap=\"sleep 1\"".to_string(),
            submit_extra_flags: "-A root".to_string(),
            token_env_var: "SLURM_JWT".to_string(),
            token_command: vec!["scontrol".to_string(), "token".to_string()],
            common_checks: true,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "controller": {
                "url": self.controller_url,
                "api_version": self.api_version,
                "auth_header": self.auth_header
            },
            "submit": {
                "tool": self.submit_tool,
                "begin": self.submit_begin,
                "wrap": self.submit_wrap,
                "extra_flags": self.submit_extra_flags
            },
            "token": {
                "env_var": self.token_env_var,
                "command": self.token_command
            },
            "checks": {
                "common": self.common_checks
            }
        })
    }
}
