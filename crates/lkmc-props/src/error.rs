//! Error types for property records and override trees.

use crate::property::Property;

/// Errors raised while building or reading a property record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// Key is not part of the property schema.
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Key was never set on this record.
    #[error("Missing property: {0}")]
    MissingProperty(Property),

    /// Value does not have the kind the key requires.
    #[error("Invalid value for property '{key}': expected {expected}")]
    InvalidValue {
        key: Property,
        expected: &'static str,
    },
}

/// Errors raised while materializing an override tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A node's overrides failed validation.
    #[error("Invalid declaration at '{path}': {source}")]
    Declaration {
        path: String,
        #[source]
        source: PropertyError,
    },

    /// The root record does not supply a default for every key.
    #[error("Root declaration is incomplete: {0}")]
    IncompleteRoot(#[source] PropertyError),

    /// Declaration text is not valid JSON or has the wrong shape.
    #[error("Failed to parse declaration: {0}")]
    Parse(#[from] serde_json::Error),
}
