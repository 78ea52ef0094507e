//! Reconciliation of the cluster fleet against policy
//!
//! For each listed cluster the reconciler fetches the current configuration,
//! normalizes a working copy, diffs it against the cleaned original and
//! submits the full desired configuration only when the delta is non-empty.
//! Clusters are processed one at a time; a failure on one cluster is recorded
//! in the report and the run moves on.

mod report;


pub use report::{ClusterOutcome, ClusterStatus, RunReport, RunSummary, Stage};

use crate::diff::{diff_configs, Delta};
use crate::directory::ClusterDirectory;
use crate::error::{DirectoryError, Result};
use crate::models::ClusterConfig;
use crate::normalizer::{strip_injected_profile, ConfigNormalizer};
use crate::observability::{operations, RunMetrics, StructuredLogger};
use crate::policy::{ApplyMode, PolicyParameters, PolicySettings};
use chrono::Utc;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info};

/// Plan for a single cluster, before anything is written back
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterPlan {
    /// Managed by the job scheduler, never a candidate
    Excluded,
    /// Worker shape or name could not be normalized
    Skipped { reason: String },
    Failed { stage: Stage, error: String },
    Ready { desired: ClusterConfig, delta: Delta },
}

/// Drives fetch → normalize → diff → apply over the fleet
pub struct Reconciler<D> {
    directory: D,
    policy: PolicyParameters,
    normalizer: ConfigNormalizer,
    metrics: RunMetrics,
    logger: StructuredLogger,
}

impl<D: ClusterDirectory> Reconciler<D> {
    pub fn new(directory: D, policy: PolicyParameters) -> Result<Self> {
        Ok(Self {
            directory,
            normalizer: ConfigNormalizer::new(&policy),
            policy,
            metrics: RunMetrics::new()?,
            logger: StructuredLogger::new("workspace"),
        })
    }

    /// Validate operator settings, then build the reconciler.
    ///
    /// Invalid settings fail here, before the directory is contacted.
    pub fn from_settings(directory: D, settings: &PolicySettings) -> Result<Self> {
        let policy = settings.validate()?;
        Self::new(directory, policy)
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn policy(&self) -> &PolicyParameters {
        &self.policy
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Process every cluster in scope and report what changed.
    ///
    /// Only a failed listing aborts the run.
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let scope = self.policy.scope();

        let cluster_ids = self
            .timed(operations::LIST, self.directory.list_clusters(scope))
            .await?;
        info!(scope = %scope, count = cluster_ids.len(), "Listed clusters");

        let mut outcomes = Vec::with_capacity(cluster_ids.len());
        for cluster_id in cluster_ids {
            if let Some(outcome) = self.process_cluster(&cluster_id).await {
                self.record(&outcome);
                outcomes.push(outcome);
            }
        }

        let report = RunReport {
            scope,
            mode: self.policy.mode(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        let summary = report.summary();
        self.logger
            .log_run_completed(summary.processed, summary.changed(), summary.failed);

        Ok(report)
    }

    /// Fetch, clean, normalize and diff one cluster without writing anything
    pub async fn plan_cluster(&self, cluster_id: &str) -> ClusterPlan {
        let mut original = match self
            .timed(operations::GET, self.directory.get_cluster_config(cluster_id))
            .await
        {
            Ok(config) => config,
            Err(e) => {
                return ClusterPlan::Failed {
                    stage: Stage::Fetch,
                    error: e.to_string(),
                }
            }
        };

        if original.is_job_managed() {
            debug!(cluster_id = %cluster_id, "Excluding job cluster");
            return ClusterPlan::Excluded;
        }

        // The cleanup is not a policy change; keep it out of the delta.
        strip_injected_profile(&mut original);

        let normalized = match self.normalizer.normalize(original.clone()) {
            Ok(normalized) => normalized,
            Err(e) => {
                return ClusterPlan::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        match diff_configs(&normalized.desired, &original) {
            Ok(delta) => ClusterPlan::Ready {
                desired: normalized.desired,
                delta,
            },
            Err(e) => ClusterPlan::Failed {
                stage: Stage::Diff,
                error: e.to_string(),
            },
        }
    }

    async fn process_cluster(&self, cluster_id: &str) -> Option<ClusterOutcome> {
        let status = match self.plan_cluster(cluster_id).await {
            ClusterPlan::Excluded => return None,
            ClusterPlan::Skipped { reason } => ClusterStatus::Skipped { reason },
            ClusterPlan::Failed { stage, error } => ClusterStatus::Failed {
                stage,
                error,
                delta: None,
            },
            ClusterPlan::Ready { delta, .. } if delta.is_empty() => ClusterStatus::Unchanged,
            ClusterPlan::Ready { desired, delta } => match self.policy.mode() {
                ApplyMode::View => ClusterStatus::Planned { delta },
                ApplyMode::Update => match self
                    .timed(
                        operations::UPDATE,
                        self.directory.update_cluster_config(cluster_id, &desired),
                    )
                    .await
                {
                    Ok(()) => ClusterStatus::Updated { delta },
                    Err(e) => ClusterStatus::Failed {
                        stage: Stage::Update,
                        error: e.to_string(),
                        delta: Some(delta),
                    },
                },
            },
        };

        Some(ClusterOutcome {
            cluster_id: cluster_id.to_string(),
            status,
        })
    }

    fn record(&self, outcome: &ClusterOutcome) {
        self.metrics.inc_outcome(outcome.status.label());

        match &outcome.status {
            ClusterStatus::Unchanged => {
                debug!(cluster_id = %outcome.cluster_id, "Cluster already compliant")
            }
            ClusterStatus::Planned { delta } => {
                self.logger
                    .log_cluster_changed(&outcome.cluster_id, delta, false)
            }
            ClusterStatus::Updated { delta } => {
                self.logger
                    .log_cluster_changed(&outcome.cluster_id, delta, true)
            }
            ClusterStatus::Skipped { reason } => {
                self.logger.log_cluster_skipped(&outcome.cluster_id, reason)
            }
            ClusterStatus::Failed { stage, error, .. } => self.logger.log_cluster_failed(
                &outcome.cluster_id,
                &stage.to_string(),
                error,
            ),
        }
    }

    async fn timed<T, F>(&self, operation: &str, call: F) -> std::result::Result<T, DirectoryError>
    where
        F: Future<Output = std::result::Result<T, DirectoryError>>,
    {
        let start = Instant::now();
        let result = call.await;
        self.metrics
            .observe_directory_call(operation, start.elapsed().as_secs_f64());
        if result.is_err() {
            self.metrics.inc_directory_errors(operation);
        }
        result
    }
}
