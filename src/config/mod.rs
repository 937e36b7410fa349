//! Lane configuration
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in lane defaults
//! 2. Host/user config (~/.config/lkmc/pathprops.toml)
//! 3. Repo config (.lkmc/pathprops.toml)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    default_host_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig,
    LaneSettings, OutputFormat, PlanSettings, DEFAULT_REPO_CONFIG,
};
pub use merge::{deep_merge, merge_layers};
