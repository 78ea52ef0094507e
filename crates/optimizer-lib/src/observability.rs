//! Observability for optimization runs
//!
//! Provides:
//! - Prometheus metrics (cluster outcomes, directory call latency)
//! - Structured logging of per-cluster outcomes with tracing

use crate::diff::Delta;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::{info, warn};

/// Histogram buckets for directory calls (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Directory operation labels
pub mod operations {
    pub const LIST: &str = "list";
    pub const GET: &str = "get";
    pub const UPDATE: &str = "update";
}

/// Metrics collected during one run
///
/// Each instance owns its registry, so runs never share counters.
#[derive(Clone)]
pub struct RunMetrics {
    registry: Registry,
    clusters: IntCounterVec,
    directory_latency_seconds: HistogramVec,
    directory_errors: IntCounterVec,
}

impl RunMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let clusters = IntCounterVec::new(
            Opts::new(
                "cluster_optimizer_clusters_total",
                "Clusters processed, by outcome",
            ),
            &["outcome"],
        )?;
        let directory_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "cluster_optimizer_directory_latency_seconds",
                "Time spent in cluster directory calls",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["operation"],
        )?;
        let directory_errors = IntCounterVec::new(
            Opts::new(
                "cluster_optimizer_directory_errors_total",
                "Failed cluster directory calls, by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(clusters.clone()))?;
        registry.register(Box::new(directory_latency_seconds.clone()))?;
        registry.register(Box::new(directory_errors.clone()))?;

        Ok(Self {
            registry,
            clusters,
            directory_latency_seconds,
            directory_errors,
        })
    }

    /// Count one cluster outcome
    pub fn inc_outcome(&self, outcome: &str) {
        self.clusters.with_label_values(&[outcome]).inc();
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.clusters.with_label_values(&[outcome]).get()
    }

    /// Record a directory call latency observation
    pub fn observe_directory_call(&self, operation: &str, duration_secs: f64) {
        self.directory_latency_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn inc_directory_errors(&self, operation: &str) {
        self.directory_errors.with_label_values(&[operation]).inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Structured logger for run events
///
/// Emits one event per cluster outcome and one completion event per run.
#[derive(Clone)]
pub struct StructuredLogger {
    workspace: String,
}

impl StructuredLogger {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    /// Log a cluster whose configuration differs from policy
    pub fn log_cluster_changed(&self, cluster_id: &str, delta: &Delta, applied: bool) {
        let event = if applied {
            "cluster_updated"
        } else {
            "cluster_planned"
        };
        info!(
            event = event,
            workspace = %self.workspace,
            cluster_id = %cluster_id,
            changed_fields = delta.flatten().len(),
            "Cluster differs from policy"
        );
    }

    /// Log a cluster the normalizer could not bring to policy
    pub fn log_cluster_skipped(&self, cluster_id: &str, reason: &str) {
        warn!(
            event = "cluster_skipped",
            workspace = %self.workspace,
            cluster_id = %cluster_id,
            reason = %reason,
            "Skipping cluster"
        );
    }

    /// Log a failed directory call for one cluster
    pub fn log_cluster_failed(&self, cluster_id: &str, stage: &str, error: &str) {
        warn!(
            event = "cluster_failed",
            workspace = %self.workspace,
            cluster_id = %cluster_id,
            stage = %stage,
            error = %error,
            "Cluster processing failed"
        );
    }

    /// Log the end of a run
    pub fn log_run_completed(&self, processed: usize, changed: usize, failed: usize) {
        info!(
            event = "run_completed",
            workspace = %self.workspace,
            processed = processed,
            changed = changed,
            failed = failed,
            "Everything has been optimized"
        );
    }
}
