//! Run report returned to the operator

use crate::diff::Delta;
use crate::policy::{ApplyMode, Scope};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Pipeline step at which a cluster failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Diff,
    Update,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Diff => write!(f, "diff"),
            Stage::Update => write!(f, "update"),
        }
    }
}

/// What happened to one cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterStatus {
    /// Already compliant, nothing submitted
    Unchanged,
    /// Differs from policy; view mode, nothing submitted
    Planned { delta: Delta },
    /// Desired configuration submitted
    Updated { delta: Delta },
    /// Could not be normalized
    Skipped { reason: String },
    /// A directory call failed
    Failed {
        stage: Stage,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<Delta>,
    },
}

impl ClusterStatus {
    /// Short label, also used as the metrics outcome
    pub fn label(&self) -> &'static str {
        match self {
            ClusterStatus::Unchanged => "unchanged",
            ClusterStatus::Planned { .. } => "planned",
            ClusterStatus::Updated { .. } => "updated",
            ClusterStatus::Skipped { .. } => "skipped",
            ClusterStatus::Failed { .. } => "failed",
        }
    }

    pub fn delta(&self) -> Option<&Delta> {
        match self {
            ClusterStatus::Planned { delta } | ClusterStatus::Updated { delta } => Some(delta),
            ClusterStatus::Failed { delta, .. } => delta.as_ref(),
            _ => None,
        }
    }
}

/// Outcome for one processed cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterOutcome {
    pub cluster_id: String,
    #[serde(flatten)]
    pub status: ClusterStatus,
}

/// Outcome counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub unchanged: usize,
    pub planned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Clusters that differ from policy, submitted or not
    pub fn changed(&self) -> usize {
        self.planned + self.updated
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scope: Scope,
    pub mode: ApplyMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ClusterOutcome>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            processed: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                ClusterStatus::Unchanged => summary.unchanged += 1,
                ClusterStatus::Planned { .. } => summary.planned += 1,
                ClusterStatus::Updated { .. } => summary.updated += 1,
                ClusterStatus::Skipped { .. } => summary.skipped += 1,
                ClusterStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn outcome(&self, cluster_id: &str) -> Option<&ClusterOutcome> {
        self.outcomes.iter().find(|o| o.cluster_id == cluster_id)
    }

    /// Outcomes with a non-empty delta
    pub fn changed(&self) -> impl Iterator<Item = &ClusterOutcome> {
        self.outcomes.iter().filter(|o| o.status.delta().is_some())
    }

    /// Skipped and failed clusters
    pub fn problems(&self) -> impl Iterator<Item = &ClusterOutcome> {
        self.outcomes.iter().filter(|o| {
            matches!(
                o.status,
                ClusterStatus::Skipped { .. } | ClusterStatus::Failed { .. }
            )
        })
    }
}
