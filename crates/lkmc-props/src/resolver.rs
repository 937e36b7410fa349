//! Path resolution over an override tree.

use serde::Serialize;
use tracing::{debug, trace};

use crate::corpus;
use crate::error::TreeError;
use crate::record::{PropertyRecord, ResolvedProperties};
use crate::tree::OverrideTree;

/// Resolves paths against an immutable override tree.
///
/// The tree is never mutated after construction, so one resolver can be
/// shared by reference across threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    tree: OverrideTree,
    defaults: ResolvedProperties,
    separator: char,
}

/// One segment matched during a walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedSegment {
    pub segment: String,
    /// Delta applied at this segment.
    pub overrides: PropertyRecord,
}

/// Result of a traced resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub path: String,
    pub matched: Vec<MatchedSegment>,
    /// First segment with no matching child, if the walk ended early.
    pub stopped_at: Option<String>,
    pub properties: ResolvedProperties,
}

impl Resolver {
    /// Create a resolver; the root node must set every schema key.
    pub fn new(tree: OverrideTree) -> Result<Self, TreeError> {
        let defaults =
            ResolvedProperties::try_from(tree.properties()).map_err(TreeError::IncompleteRoot)?;
        Ok(Self {
            tree,
            defaults,
            separator: std::path::MAIN_SEPARATOR,
        })
    }

    /// Resolver over the built-in userland declaration.
    pub fn builtin() -> Result<Self, TreeError> {
        Self::new(OverrideTree::build(&corpus::declaration())?)
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn tree(&self) -> &OverrideTree {
        &self.tree
    }

    /// Properties every path starts from.
    pub fn defaults(&self) -> &ResolvedProperties {
        &self.defaults
    }

    /// Resolve the properties of `path`.
    pub fn resolve(&self, path: &str) -> ResolvedProperties {
        let mut properties = self.defaults.clone();
        self.walk(path, |_, node| properties.apply(node.properties()));
        properties
    }

    /// Resolve `path`, recording every segment that contributed.
    pub fn trace(&self, path: &str) -> Resolution {
        let mut properties = self.defaults.clone();
        let mut matched = Vec::new();
        let stopped_at = self.walk(path, |segment, node| {
            properties.apply(node.properties());
            matched.push(MatchedSegment {
                segment: segment.to_string(),
                overrides: node.properties().clone(),
            });
        });

        Resolution {
            path: path.to_string(),
            matched,
            stopped_at: stopped_at.map(str::to_string),
            properties,
        }
    }

    /// Walk the contiguous run of segments that match the tree from the
    /// root, calling `visit` for each. Returns the first unmatched segment.
    fn walk<'a, F>(&'a self, path: &'a str, mut visit: F) -> Option<&'a str>
    where
        F: FnMut(&'a str, &'a OverrideTree),
    {
        let mut node = &self.tree;
        for segment in path.split(self.separator) {
            match node.child(segment) {
                Some(child) => {
                    trace!(segment, "matched override node");
                    visit(segment, child);
                    node = child;
                }
                None => {
                    debug!(path, segment, "resolution stopped at unmatched segment");
                    return Some(segment);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Declaration;
    use serde_json::json;

    fn resolver(value: serde_json::Value) -> Resolver {
        let declaration: Declaration = serde_json::from_value(value).unwrap();
        Resolver::new(OverrideTree::build(&declaration).unwrap())
            .unwrap()
            .with_separator('/')
    }

    fn small() -> Resolver {
        resolver(json!([
            {
                "allowed_archs": null, "c_std": null, "cc_flags": ["-root"],
                "cc_pedantic": true, "cxx_std": null, "exit_status": 0,
                "extra_objs_lkmc_common": false, "extra_objs_userland_asm": false,
                "interactive": false, "more_than_1s": false, "no_executable": false,
                "pedantic": false, "receives_signal": false,
                "requires_kernel_modules": false, "skip_run_unclassified": false
            },
            {
                "a": [
                    {"cc_flags": ["-a"], "exit_status": 3},
                    {
                        "b": [{"cc_flags": ["-b"]}, {"deep.c": {"exit_status": 4}}],
                        "x": {"interactive": true}
                    }
                ],
                "deep.c": {"exit_status": 9}
            }
        ]))
    }

    #[test]
    fn test_incomplete_root_rejected() {
        let declaration: Declaration = serde_json::from_value(json!({"exit_status": 0})).unwrap();
        let err = Resolver::new(OverrideTree::build(&declaration).unwrap()).unwrap_err();
        assert!(matches!(err, TreeError::IncompleteRoot(_)));
    }

    #[test]
    fn test_flags_accumulate_in_order() {
        let props = small().resolve("a/b/deep.c");
        assert_eq!(props.cc_flags, vec!["-root", "-a", "-b"]);
        assert_eq!(props.exit_status, 4);
    }

    #[test]
    fn test_unmatched_path_yields_defaults() {
        let r = small();
        assert_eq!(&r.resolve("nothing/here.c"), r.defaults());
        assert_eq!(&r.resolve(""), r.defaults());
    }

    #[test]
    fn test_walk_stops_at_first_miss() {
        // "deep.c" exists at the root, but only a contiguous prefix counts
        let props = small().resolve("a/zzz/deep.c");
        assert_eq!(props.exit_status, 3);
        assert_eq!(props.cc_flags, vec!["-root", "-a"]);
    }

    #[test]
    fn test_leading_separator_does_not_match() {
        let r = small();
        assert_eq!(&r.resolve("/a/b"), r.defaults());
    }

    #[test]
    fn test_trace_records_segments() {
        let resolution = small().trace("a/x/extra");
        let segments: Vec<_> = resolution.matched.iter().map(|m| m.segment.as_str()).collect();
        assert_eq!(segments, vec!["a", "x"]);
        assert_eq!(resolution.stopped_at.as_deref(), Some("extra"));
        assert!(resolution.properties.interactive);
        assert_eq!(resolution.properties, small().resolve("a/x/extra"));
    }

    #[test]
    fn test_custom_separator() {
        let r = small().with_separator('\\');
        assert_eq!(r.resolve("a\\b").cc_flags, vec!["-root", "-a", "-b"]);
        assert_eq!(&r.resolve("a/b"), r.defaults());
    }

    #[test]
    fn test_shared_across_threads() {
        let resolver = small();
        let r = &resolver;
        std::thread::scope(|s| {
            let handles: Vec<_> = ["a/b/deep.c", "a/x", "deep.c"]
                .into_iter()
                .map(|path| s.spawn(move || r.resolve(path).exit_status))
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(results, vec![4, 3, 9]);
        });
    }
}
