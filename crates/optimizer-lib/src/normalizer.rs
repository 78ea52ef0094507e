//! Policy normalization of cluster configurations
//!
//! Rules run in a fixed order because later rules read what earlier ones
//! set:
//! 1. strip the injected cluster profile from `spark_conf`
//! 2. classify the worker shape and canonicalize the autoscale range
//! 3. classify the workload from the runtime version
//! 4. replace custom tags with the workload and worker tags
//! 5. set the idle-shutdown timeout
//! 6. rebuild the display name (only when renaming is on)

use crate::error::NormalizeError;
use crate::models::{AutoScale, ClusterConfig};
use crate::policy::{PolicyParameters, RenameToggle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// `spark_conf` key injected by the control plane for single-node clusters
pub const INJECTED_PROFILE_KEY: &str = "spark.databricks.cluster.profile";

/// Substring of `spark_version` marking a machine-learning runtime
pub const ML_RUNTIME_MARKER: &str = "ml";

/// Worker shape of a cluster after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerShape {
    SingleNode,
    MultiNode { min_workers: u32, max_workers: u32 },
}

impl WorkerShape {
    /// Tag value written to `custom_tags.Workers`
    pub fn tag(&self) -> &'static str {
        match self {
            WorkerShape::SingleNode => "SingleNode",
            WorkerShape::MultiNode { .. } => "MultiNode",
        }
    }

    /// Worker segment of the display name
    pub fn descriptor(&self) -> String {
        match self {
            WorkerShape::SingleNode => "0".to_string(),
            WorkerShape::MultiNode {
                min_workers,
                max_workers,
            } => format!("{}_{}", min_workers, max_workers),
        }
    }
}

/// Workload class derived from the runtime version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkloadType {
    #[serde(rename = "AI")]
    Ai,
    Standard,
}

impl WorkloadType {
    pub fn classify(spark_version: Option<&str>) -> Self {
        match spark_version {
            Some(version) if version.contains(ML_RUNTIME_MARKER) => WorkloadType::Ai,
            _ => WorkloadType::Standard,
        }
    }
}

impl fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadType::Ai => write!(f, "AI"),
            WorkloadType::Standard => write!(f, "Standard"),
        }
    }
}

/// Desired state produced by [`ConfigNormalizer::normalize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub desired: ClusterConfig,
    pub shape: WorkerShape,
    pub workload: WorkloadType,
}

/// Remove the injected cluster profile from `spark_conf`
pub fn strip_injected_profile(config: &mut ClusterConfig) {
    if let Some(conf) = config.spark_conf.as_mut() {
        conf.remove(INJECTED_PROFILE_KEY);
    }
}

/// Applies the operating policy to one cluster configuration
#[derive(Debug, Clone)]
pub struct ConfigNormalizer {
    idle_minutes: u32,
    rename: bool,
}

impl ConfigNormalizer {
    pub fn new(policy: &PolicyParameters) -> Self {
        Self {
            idle_minutes: policy.idle_minutes(),
            rename: policy.rename() == RenameToggle::On,
        }
    }

    /// Turn an owned working copy into the desired-state configuration
    pub fn normalize(&self, mut config: ClusterConfig) -> Result<Normalized, NormalizeError> {
        strip_injected_profile(&mut config);

        let shape = canonicalize_workers(&mut config)?;
        let workload = WorkloadType::classify(config.spark_version.as_deref());

        config.custom_tags = Some(BTreeMap::from([
            ("Type".to_string(), workload.to_string()),
            ("Workers".to_string(), shape.tag().to_string()),
        ]));
        config.autotermination_minutes = Some(self.idle_minutes);

        if self.rename {
            let name = config
                .cluster_name
                .as_deref()
                .ok_or(NormalizeError::MissingClusterName)?;
            config.cluster_name = Some(conventional_name(name, workload, shape));
        }

        Ok(Normalized {
            desired: config,
            shape,
            workload,
        })
    }
}

/// Classify the worker shape, rewriting the config to the canonical form.
///
/// An autoscale range takes precedence over a fixed count; the fixed count is
/// dropped so a config never carries both.
fn canonicalize_workers(config: &mut ClusterConfig) -> Result<WorkerShape, NormalizeError> {
    if let Some(autoscale) = &config.autoscale {
        let max_workers = autoscale
            .max_workers
            .ok_or(NormalizeError::MissingMaxWorkers)?;
        config.autoscale = Some(AutoScale::canonical(max_workers));
        config.num_workers = None;
        return Ok(WorkerShape::MultiNode {
            min_workers: 1,
            max_workers,
        });
    }

    match config.num_workers {
        Some(0) => Ok(WorkerShape::SingleNode),
        Some(count) => {
            config.autoscale = Some(AutoScale::canonical(count));
            config.num_workers = None;
            Ok(WorkerShape::MultiNode {
                min_workers: 1,
                max_workers: count,
            })
        }
        None => Err(NormalizeError::UnclassifiedWorkers),
    }
}

/// `<prefix>-<workload>-<workers>-dev`, prefix being the name up to the first `-`
pub fn conventional_name(current: &str, workload: WorkloadType, shape: WorkerShape) -> String {
    let prefix = current.split('-').next().unwrap_or(current);
    format!("{}-{}-{}-dev", prefix, workload, shape.descriptor())
}
