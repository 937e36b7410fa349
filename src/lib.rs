//! LKMC path properties lane
//!
//! Resolves per-file build/test properties for the userland example corpus
//! and wraps the resolver with layered configuration, explain output and
//! source-tree planning.

pub mod config;
pub mod explain;
pub mod lane;
pub mod plan;
pub mod telemetry;

pub use config::{EffectiveConfig, LaneSettings};
pub use explain::ExplainOutput;
pub use lane::{ArchDecision, Lane, LaneError};
pub use lkmc_props::{
    corpus, AllowedArchs, Declaration, OverrideTree, Property, PropertyError, PropertyRecord,
    PropertyValue, Resolution, ResolvedProperties, Resolver, SkipReason, TreeError,
};
pub use plan::{plan, Plan, PlanError};
