//! Effective configuration with full provenance
//!
//! The effective config captures the merged lane configuration plus
//! information about where each layer came from.

use chrono::{DateTime, Utc};
use globset::Glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Schema identifier
pub const SCHEMA_ID: &str = "lkmc-pathprops/effective_config@1";

/// Repo config location relative to the working directory
pub const DEFAULT_REPO_CONFIG: &str = ".lkmc/pathprops.toml";

/// Host config location: `~/.config/lkmc/pathprops.toml`
pub fn default_host_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config/lkmc/pathprops.toml"))
}

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Repo,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Human,
}

/// File selection for `plan`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSettings {
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Typed view of the merged configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaneSettings {
    pub archs: Vec<String>,
    pub separator: char,
    pub output: OutputFormat,

    /// JSON declaration replacing the built-in tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<PathBuf>,

    pub plan: PlanSettings,
}

impl Default for LaneSettings {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            archs: defaults.archs,
            separator: '/',
            output: OutputFormat::Json,
            declaration: None,
            plan: PlanSettings {
                include: defaults.plan_include,
                exclude: defaults.plan_exclude,
            },
        }
    }
}

impl EffectiveConfig {
    /// Build effective config from layers
    pub fn build(
        host_config_path: Option<&Path>,
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (ConfigOrigin::Host, host_config_path),
            (ConfigOrigin::Repo, repo_config_path),
        ] {
            let Some(path) = path.filter(|p| p.exists()) else {
                continue;
            };
            let (value, digest) = Self::load_toml_file(path)?;
            debug!(origin = ?origin, path = %path.display(), "loaded config layer");
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
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

        let merged = merge_layers(layers);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Validate configuration values
    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        match config.get("archs").and_then(|v| v.as_array()) {
            Some(archs) if !archs.is_empty() => {
                if !archs.iter().all(|a| a.as_str().is_some_and(|s| !s.is_empty())) {
                    return invalid("archs must contain non-empty strings");
                }
            }
            _ => return invalid("archs must be a non-empty list"),
        }

        match config.get("separator").and_then(|v| v.as_str()) {
            Some(sep) if sep.chars().count() == 1 => {}
            _ => return invalid("separator must be exactly one character"),
        }

        match config.get("output").and_then(|v| v.as_str()) {
            Some("json") | Some("human") => {}
            _ => return invalid("output must be \"json\" or \"human\""),
        }

        if let Some(declaration) = config.get("declaration") {
            if !declaration.is_string() {
                return invalid("declaration must be a file path");
            }
        }

        for key in ["include", "exclude"] {
            let Some(patterns) = config.get("plan").and_then(|p| p.get(key)) else {
                continue;
            };
            let Some(patterns) = patterns.as_array() else {
                return Err(ConfigError::ValidationError(format!(
                    "plan.{} must be a list of globs",
                    key
                )));
            };
            for pattern in patterns {
                let pattern = pattern.as_str().ok_or_else(|| {
                    ConfigError::ValidationError(format!("plan.{} must be a list of globs", key))
                })?;
                Glob::new(pattern).map_err(|e| {
                    ConfigError::ValidationError(format!("plan.{}: {}", key, e))
                })?;
            }
        }

        Ok(())
    }

    /// Typed lane settings from the merged config
    pub fn settings(&self) -> Result<LaneSettings, ConfigError> {
        serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
