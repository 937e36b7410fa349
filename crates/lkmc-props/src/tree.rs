//! Declarations and the override tree built from them.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TreeError;
use crate::record::PropertyRecord;

/// Raw overrides as written in a declaration.
pub type Overrides = Map<String, Value>;

/// Nested declaration of an override tree.
///
/// In JSON a leaf is an object of overrides and a branch is a two element
/// array `[overrides, {segment: declaration, ...}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Declaration {
    Branch(Overrides, BTreeMap<String, Declaration>),
    Leaf(Overrides),
}

impl Declaration {
    /// Parse a declaration from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn overrides(&self) -> &Overrides {
        match self {
            Declaration::Branch(overrides, _) | Declaration::Leaf(overrides) => overrides,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, Declaration>> {
        match self {
            Declaration::Branch(_, children) => Some(children),
            Declaration::Leaf(_) => None,
        }
    }
}

/// A node of the override tree: the delta introduced at this segment plus
/// the nodes below it.
#[derive(Debug, Clone, Default)]
pub struct OverrideTree {
    properties: PropertyRecord,
    children: HashMap<String, OverrideTree>,
}

impl OverrideTree {
    /// Materialize every node of `declaration`.
    pub fn build(declaration: &Declaration) -> Result<Self, TreeError> {
        Self::build_node(declaration, "")
    }

    fn build_node(declaration: &Declaration, path: &str) -> Result<Self, TreeError> {
        let properties =
            PropertyRecord::from_json(declaration.overrides()).map_err(|source| {
                TreeError::Declaration {
                    path: if path.is_empty() { "/".to_string() } else { path.to_string() },
                    source,
                }
            })?;

        let mut children = HashMap::new();
        for (segment, child) in declaration.children().into_iter().flatten() {
            let child_path = format!("{}/{}", path, segment);
            children.insert(segment.clone(), Self::build_node(child, &child_path)?);
        }

        Ok(Self {
            properties,
            children,
        })
    }

    /// Overrides introduced at this node only.
    pub fn properties(&self) -> &PropertyRecord {
        &self.properties
    }

    pub fn child(&self, segment: &str) -> Option<&OverrideTree> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &OverrideTree)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(OverrideTree::node_count).sum::<usize>()
    }
}
