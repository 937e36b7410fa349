//! Build/test plan over a source tree
//!
//! Discovers source files under a root directory and resolves each one.
//! Nothing is compiled or executed here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::PlanSettings;
use crate::lane::{ArchDecision, Lane};

/// Plan errors
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// One planned source file
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    /// Path relative to the plan root, joined with the lane separator
    pub path: String,
    pub exit_status: i64,
    pub decisions: Vec<ArchDecision>,
}

/// Per-architecture counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchSummary {
    pub build: usize,
    pub test: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanSummary {
    pub files: usize,
    pub archs: BTreeMap<String, ArchSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub root: PathBuf,
    pub entries: Vec<PlanEntry>,
    pub summary: PlanSummary,
}

impl Plan {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for entry in &self.entries {
            let built: Vec<_> = entry
                .decisions
                .iter()
                .filter(|d| d.build)
                .map(|d| if d.test { d.arch.clone() } else { format!("{}(build)", d.arch) })
                .collect();
            let status = if built.is_empty() { "-".to_string() } else { built.join(" ") };
            lines.push(format!("{}  {}", entry.path, status));
        }
        lines.push(String::new());
        lines.push(format!("{} file(s)", self.summary.files));
        for (arch, counts) in &self.summary.archs {
            lines.push(format!("  {:<8} build {:>4}  test {:>4}", arch, counts.build, counts.test));
        }
        lines.join("\n")
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, PlanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Resolve every selected file under `root`.
pub fn plan(root: &Path, lane: &Lane, settings: &PlanSettings) -> Result<Plan, PlanError> {
    let include = glob_set(&settings.include)?;
    let exclude = glob_set(&settings.exclude)?;
    let separator = lane.resolver().separator().to_string();

    let mut entries = Vec::new();
    let mut summary = PlanSummary::default();
    for arch in lane.archs() {
        summary.archs.insert(arch.clone(), ArchSummary::default());
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| PlanError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        // globs always see '/' regardless of the lane separator
        let glob_path = segments.join("/");
        if !include.is_match(&glob_path) || exclude.is_match(&glob_path) {
            debug!(path = %glob_path, "not selected");
            continue;
        }

        let key = segments.join(separator.as_str());
        let properties = lane.resolver().resolve(&key);
        let decisions = lane.decisions(&properties);
        for decision in &decisions {
            if let Some(counts) = summary.archs.get_mut(&decision.arch) {
                counts.build += usize::from(decision.build);
                counts.test += usize::from(decision.test);
            }
        }

        entries.push(PlanEntry {
            path: key,
            exit_status: properties.exit_status,
            decisions,
        });
    }

    summary.files = entries.len();
    info!(root = %root.display(), files = summary.files, "plan complete");

    Ok(Plan {
        root: root.to_path_buf(),
        entries,
        summary,
    })
}
