//! The lane: a resolver plus the architectures it is evaluated for.

use std::fs;
use std::path::PathBuf;

use lkmc_props::{Declaration, OverrideTree, ResolvedProperties, Resolver, TreeError};
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigError, LaneSettings};

/// Errors raised while assembling a lane
#[derive(Debug, thiserror::Error)]
pub enum LaneError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Failed to read declaration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build/test decision for one architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchDecision {
    pub arch: String,
    pub build: bool,
    pub test: bool,
}

#[derive(Debug, Clone)]
pub struct Lane {
    resolver: Resolver,
    declaration: Declaration,
    archs: Vec<String>,
}

impl Lane {
    /// Build the resolver described by `settings`.
    pub fn from_settings(settings: &LaneSettings) -> Result<Self, LaneError> {
        let declaration = match &settings.declaration {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| LaneError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!(path = %path.display(), "using declaration file");
                Declaration::from_json_str(&text)?
            }
            None => lkmc_props::corpus::declaration(),
        };
        Self::new(declaration, settings.archs.clone(), settings.separator)
    }

    pub fn new(
        declaration: Declaration,
        archs: Vec<String>,
        separator: char,
    ) -> Result<Self, LaneError> {
        let tree = OverrideTree::build(&declaration)?;
        info!(nodes = tree.node_count(), "override tree built");
        let resolver = Resolver::new(tree)?.with_separator(separator);
        Ok(Self {
            resolver,
            declaration,
            archs,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The declaration the tree was built from.
    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn archs(&self) -> &[String] {
        &self.archs
    }

    pub fn decisions(&self, properties: &ResolvedProperties) -> Vec<ArchDecision> {
        self.archs
            .iter()
            .map(|arch| ArchDecision {
                arch: arch.clone(),
                build: properties.should_be_built(arch),
                test: properties.should_be_tested(arch),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_lane() {
        let lane = Lane::from_settings(&LaneSettings::default()).unwrap();
        let props = lane.resolver().resolve("userland/arch/aarch64/freestanding/x.S");
        let decisions = lane.decisions(&props);

        assert_eq!(decisions.len(), 3);
        assert!(decisions.iter().all(|d| d.build == (d.arch == "aarch64")));
    }

    #[test]
    fn test_declaration_file() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(
            temp,
            r#"[{{"allowed_archs": null, "c_std": null, "cc_flags": [], "cc_pedantic": true,
                "cxx_std": null, "exit_status": 0, "extra_objs_lkmc_common": false,
                "extra_objs_userland_asm": false, "interactive": false, "more_than_1s": false,
                "no_executable": false, "pedantic": false, "receives_signal": false,
                "requires_kernel_modules": false, "skip_run_unclassified": false}},
               {{"slow.c": {{"more_than_1s": true}}}}]"#
        )
        .unwrap();

        let settings = LaneSettings {
            declaration: Some(temp.path().to_path_buf()),
            ..LaneSettings::default()
        };
        let lane = Lane::from_settings(&settings).unwrap();
        assert!(lane.resolver().resolve("slow.c").more_than_1s);
        assert_eq!(lane.resolver().tree().node_count(), 2);
    }

    #[test]
    fn test_missing_declaration_file() {
        let settings = LaneSettings {
            declaration: Some(PathBuf::from("/nonexistent/tree.json")),
            ..LaneSettings::default()
        };
        assert!(matches!(
            Lane::from_settings(&settings),
            Err(LaneError::Io { .. })
        ));
    }

    #[test]
    fn test_unknown_key_in_declaration_file() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, r#"{{"optimise": true}}"#).unwrap();

        let settings = LaneSettings {
            declaration: Some(temp.path().to_path_buf()),
            ..LaneSettings::default()
        };
        let err = Lane::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("Unknown property: optimise"));
    }
}
