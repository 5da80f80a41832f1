//! Configuration layering
//!
//! Merges, lowest precedence first:
//! 1. Built-in defaults
//! 2. Host config (~/.config/sbatch-verify/config.toml)
//! 3. Explicit config file (--config)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
pub use settings::{CheckSettings, ControllerSettings, Settings, SubmitSettings, TokenSettings};
