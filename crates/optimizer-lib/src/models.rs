//! Core data models for cluster configurations
//!
//! A [`ClusterConfig`] is the projection of a control-plane cluster definition
//! onto the attributes this tool monitors and writes back. Anything else the
//! control plane returns is dropped at the directory boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Provenance value marking clusters created by the job scheduler
pub const JOB_CLUSTER_SOURCE: &str = "JOB";

/// Attribute names kept when projecting a fetched cluster definition
pub const RECOGNIZED_ATTRIBUTES: &[&str] = &[
    "num_workers",
    "autoscale",
    "cluster_name",
    "spark_version",
    "spark_conf",
    "node_type_id",
    "driver_node_type_id",
    "ssh_public_keys",
    "custom_tags",
    "cluster_log_conf",
    "init_scripts",
    "spark_env_vars",
    "autotermination_minutes",
    "enable_elastic_disk",
    "cluster_source",
    "instance_pool_id",
    "policy_id",
    "enable_local_disk_encryption",
    "driver_instance_pool_id",
    "workload_type",
    "runtime_engine",
    "docker_image",
    "data_security_mode",
    "single_user_name",
    "cluster_id",
    "apply_policy_default_value",
];

/// Autoscaling range of a multi-node cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_workers: Option<u32>,
}

impl AutoScale {
    /// Canonical autoscale shape: floor of one worker, one target worker
    pub fn canonical(max_workers: u32) -> Self {
        Self {
            min_workers: Some(1),
            max_workers: Some(max_workers),
            target_workers: Some(1),
        }
    }
}

/// Cluster definition restricted to the recognized attribute set
///
/// Unset attributes are `None` and are omitted when the configuration is
/// serialized, so the JSON form only ever carries attributes that are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<AutoScale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_conf: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autotermination_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_node_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_public_keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_log_conf: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_scripts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_env_vars: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_elastic_disk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_local_disk_encryption: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_instance_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_security_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_policy_default_value: Option<bool>,
}

impl ClusterConfig {
    /// Project a raw control-plane definition onto the recognized attributes.
    ///
    /// Unrecognized keys are dropped, as are top-level `null` and empty-string
    /// values. Fails if a recognized attribute has an unexpected type.
    pub fn project(raw: Value) -> Result<Self, serde_json::Error> {
        let projected: Map<String, Value> = match raw {
            Value::Object(map) => map
                .into_iter()
                .filter(|(key, _)| RECOGNIZED_ATTRIBUTES.contains(&key.as_str()))
                .filter(|(_, value)| !is_unset(value))
                .collect(),
            other => return serde_json::from_value(other),
        };
        serde_json::from_value(Value::Object(projected))
    }

    /// True when the cluster was created by the job scheduler
    pub fn is_job_managed(&self) -> bool {
        self.cluster_source.as_deref() == Some(JOB_CLUSTER_SOURCE)
    }

    /// JSON object form used for structural comparison
    pub fn to_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Entry of the cluster listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: String,
    #[serde(default)]
    pub creator_user_name: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
}
