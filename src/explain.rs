//! Explain output for a resolution
//!
//! Shows which tree nodes contributed to a path's properties and why each
//! architecture is or is not built and tested.

use lkmc_props::{AllowedArchs, MatchedSegment, Resolution, ResolvedProperties, SkipReason};
use serde::Serialize;

/// Per-architecture verdict with the reasons behind it
#[derive(Debug, Clone, Serialize)]
pub struct ArchVerdict {
    pub arch: String,
    pub build: bool,
    pub test: bool,
    pub skip_reasons: Vec<SkipReason>,
}

/// Explanation of how a path was resolved
#[derive(Debug, Clone, Serialize)]
pub struct ExplainOutput {
    pub path: String,

    /// Segments that matched the tree, with the overrides each applied
    pub matched: Vec<MatchedSegment>,

    /// First segment without a matching node
    pub stopped_at: Option<String>,

    pub properties: ResolvedProperties,

    pub verdicts: Vec<ArchVerdict>,
}

impl ExplainOutput {
    pub fn from_resolution(resolution: Resolution, archs: &[String]) -> Self {
        let verdicts = archs
            .iter()
            .map(|arch| ArchVerdict {
                arch: arch.clone(),
                build: resolution.properties.should_be_built(arch),
                test: resolution.properties.should_be_tested(arch),
                skip_reasons: resolution.properties.skip_reasons(arch),
            })
            .collect();

        Self {
            path: resolution.path,
            matched: resolution.matched,
            stopped_at: resolution.stopped_at,
            properties: resolution.properties,
            verdicts,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_human(&self) -> String {
        let mut lines = vec![format!("Path: {}", self.path), String::new()];

        if self.matched.is_empty() {
            lines.push("Matched: (root defaults only)".to_string());
        } else {
            lines.push("Matched:".to_string());
            for segment in &self.matched {
                let overrides = if segment.overrides.is_empty() {
                    "(no overrides)".to_string()
                } else {
                    serde_json::to_string(&segment.overrides).unwrap_or_default()
                };
                lines.push(format!("  {}  {}", segment.segment, overrides));
            }
        }
        if let Some(ref segment) = self.stopped_at {
            lines.push(format!("Stopped at: {}", segment));
        }
        lines.push(String::new());

        let props = &self.properties;
        let archs = match &props.allowed_archs {
            AllowedArchs::Unrestricted => "any".to_string(),
            AllowedArchs::Only(set) => set.iter().cloned().collect::<Vec<_>>().join(", "),
        };
        lines.push(format!("Allowed archs: {}", archs));
        lines.push(format!("C std: {}", props.c_std.as_deref().unwrap_or("default")));
        lines.push(format!("C++ std: {}", props.cxx_std.as_deref().unwrap_or("default")));
        lines.push(format!("Flags: {}", props.cc_flags.join(" ")));
        lines.push(format!("Exit status: {}", props.exit_status));
        lines.push(String::new());

        for verdict in &self.verdicts {
            let decision = match (verdict.build, verdict.test) {
                (true, true) => "build + test",
                (true, false) => "build only",
                _ => "skip",
            };
            let mut line = format!("  {:<8} {}", verdict.arch, decision);
            if !verdict.skip_reasons.is_empty() {
                let reasons: Vec<_> = verdict
                    .skip_reasons
                    .iter()
                    .filter_map(|r| serde_json::to_value(r).ok())
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                line.push_str(&format!(" ({})", reasons.join(", ")));
            }
            lines.push(line);
        }

        lines.join("\n")
    }
}
