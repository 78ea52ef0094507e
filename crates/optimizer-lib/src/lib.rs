//! Cluster policy optimizer library
//!
//! This crate provides the core functionality for:
//! - Projecting control-plane cluster definitions onto a typed model
//! - Normalizing configurations to an operating policy
//! - Structural diffing of configuration trees
//! - Reconciling the fleet and writing back only what changed
//! - Run metrics and structured logging

pub mod diff;
pub mod directory;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod observability;
pub mod policy;
pub mod reconcile;

pub use diff::{diff_configs, diff_maps, Change, Delta, FieldChange};
pub use directory::{ClusterDirectory, HttpDirectory, WorkspaceContext};
pub use error::{DirectoryError, NormalizeError, OptimizeError};
pub use models::*;
pub use normalizer::{ConfigNormalizer, Normalized, WorkerShape, WorkloadType};
pub use observability::{RunMetrics, StructuredLogger};
pub use policy::{ApplyMode, PolicyParameters, PolicySettings, RenameToggle, Scope};
pub use reconcile::{
    ClusterOutcome, ClusterPlan, ClusterStatus, Reconciler, RunReport, RunSummary, Stage,
};
