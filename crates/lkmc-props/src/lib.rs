//! Path-keyed build/test property resolution.
//!
//! A tree of overrides keyed by path segment is walked from the root for a
//! given source path, merging each matching node's delta into a complete
//! set of properties. The result answers whether the path should be built
//! for an architecture, and whether the resulting binary should be run as
//! part of the test suite.
//!
//! This crate never touches the filesystem or spawns processes.

pub mod corpus;
mod error;
mod property;
mod record;
mod resolver;
mod tree;

pub use error::{PropertyError, TreeError};
pub use property::{AllowedArchs, Property, PropertyValue, ValueKind};
pub use record::{PropertyRecord, ResolvedProperties, SkipReason};
pub use resolver::{MatchedSegment, Resolution, Resolver};
pub use tree::{Declaration, OverrideTree, Overrides};
