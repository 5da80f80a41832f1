//! Typed view of the merged configuration.

use serde::{Deserialize, Serialize};

/// All settings the harness reads after layering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub controller: ControllerSettings,
    pub submit: SubmitSettings,
    pub token: TokenSettings,
    #[serde(default)]
    pub checks: CheckSettings,
}

/// Where and how to reach slurmrestd.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSettings {
    pub url: String,
    pub api_version: String,
    pub auth_header: String,
}

/// Fixed parts of every submission command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitSettings {
    pub tool: String,
    #[serde(default)]
    pub begin: String,
    #[serde(default)]
    pub wrap: String,
    #[serde(default)]
    pub extra_flags: String,
}

/// Token acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Checked first; a non-empty value bypasses `command`.
    pub env_var: String,
    /// Program and arguments printing `NAME=token`.
    pub command: Vec<String>,
}

/// Post-checks overlaid on every accepted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSettings {
    #[serde(default = "default_true")]
    pub common: bool,
    /// When set, `mail_user` must equal `$USER@<mail_domain>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_domain: Option<String>,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            common: true,
            mail_domain: None,
        }
    }
}

fn default_true() -> bool {
    true
}
