//! Built-in lane defaults (layer 1)
//!
//! Hardcoded defaults for every lane setting.

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Architectures evaluated by `resolve`, `explain` and `plan`
    pub archs: Vec<String>,

    /// Path segment separator (default: "/")
    pub separator: String,

    /// Output format: "json" or "human" (default: "json")
    pub output: String,

    /// Globs a file must match to be planned
    pub plan_include: Vec<String>,

    /// Globs that drop a file from the plan
    pub plan_exclude: Vec<String>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            archs: vec!["x86_64".to_string(), "arm".to_string(), "aarch64".to_string()],
            separator: "/".to_string(),
            output: "json".to_string(),
            plan_include: vec![
                "**/*.c".to_string(),
                "**/*.cpp".to_string(),
                "**/*.S".to_string(),
            ],
            plan_exclude: Vec::new(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "archs": self.archs,
            "separator": self.separator,
            "output": self.output,
            "plan": {
                "include": self.plan_include,
                "exclude": self.plan_exclude
            }
        })
    }
}
