//! Effective configuration with provenance
//!
//! Records the merged configuration together with every file or flag
//! layer that contributed to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::settings::Settings;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "sbatch-verify/effective_config@1";

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    File,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged configuration plus provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,

    pub schema_id: String,

    pub created_at: DateTime<Utc>,

    /// Merged configuration with secret-looking values redacted
    pub config: Value,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,

    /// Typed settings, parsed before redaction
    #[serde(skip)]
    settings: Option<Settings>,
}

/// Keys whose scalar values never appear in printed config
const SECRET_KEYS: &[&str] = &["password", "secret", "jwt", "credential", "api_key", "private_key"];

impl EffectiveConfig {
    /// Default host config location: `$HOME/.config/sbatch-verify/config.toml`
    pub fn default_host_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/sbatch-verify/config.toml"))
    }

    /// CLI layer from `--controller` / `--api-version`, `None` when neither is given.
    pub fn cli_layer(controller: Option<&str>, api_version: Option<&str>) -> Option<Value> {
        let mut section = serde_json::Map::new();
        if let Some(url) = controller {
            section.insert("url".to_string(), Value::String(url.to_string()));
        }
        if let Some(version) = api_version {
            section.insert("api_version".to_string(), Value::String(version.to_string()));
        }
        if section.is_empty() {
            return None;
        }
        let mut layer = serde_json::Map::new();
        layer.insert("controller".to_string(), Value::Object(section));
        Some(Value::Object(layer))
    }

    /// Layer builtin defaults, the host file (skipped if absent), an explicit
    /// file (must exist), and CLI overrides.
    pub fn build(
        host_config_path: Option<&Path>,
        config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = host_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Host,
                    path: Some(path.display().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.display().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let mut merged = merge_layers(layers);
        let settings: Settings = serde_json::from_value(merged.clone())
            .map_err(|e| ConfigError::Parse(format!("invalid configuration: {}", e)))?;
        Self::validate(&settings)?;

        let redactions = Self::redact_secrets(&mut merged);

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
            redactions,
            settings: Some(settings),
        })
    }

    /// Typed settings. Only `None` for a config deserialized from JSON.
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let digest = hex::encode(Sha256::digest(&bytes));

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::Parse(format!("{}: invalid UTF-8: {}", path.display(), e)))?;

        // toml::Value implements Serialize, so the JSON view is a direct conversion
        let table: toml::Table = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        let value = serde_json::to_value(table)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        Ok((value, digest))
    }

    fn redact_secrets(value: &mut Value) -> Vec<String> {
        let mut redactions = Vec::new();
        Self::redact_recursive(value, "", &mut redactions);
        redactions
    }

    fn redact_recursive(value: &mut Value, path: &str, redactions: &mut Vec<String>) {
        if let Value::Object(map) = value {
            for (key, val) in map.iter_mut() {
                let current = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                let lower = key.to_lowercase();
                if SECRET_KEYS.iter().any(|s| lower.contains(s)) && !val.is_object() {
                    *val = Value::String("[REDACTED]".to_string());
                    redactions.push(current);
                } else {
                    Self::redact_recursive(val, &current, redactions);
                }
            }
        }
    }

    fn validate(settings: &Settings) -> Result<(), ConfigError> {
        let url = &settings.controller.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "controller.url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if !settings.controller.api_version.starts_with('v') {
            return Err(ConfigError::Validation(format!(
                "controller.api_version must look like v0.0.40, got '{}'",
                settings.controller.api_version
            )));
        }
        if settings.controller.auth_header.trim().is_empty() {
            return Err(ConfigError::Validation("controller.auth_header must not be empty".to_string()));
        }
        if settings.submit.tool.trim().is_empty() {
            return Err(ConfigError::Validation("submit.tool must not be empty".to_string()));
        }
        if settings.token.command.is_empty() {
            return Err(ConfigError::Validation("token.command must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a value by dot-separated path
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.config, |current, part| current.get(part))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
