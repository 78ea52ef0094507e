//! Error taxonomy for optimization runs

use thiserror::Error;

/// Run-level errors. Any of these stops the run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid policy: {0}")]
    Configuration(String),

    #[error("missing credential: {0}")]
    Credential(String),

    #[error("cluster directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Failure of a single call to the cluster directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid workspace endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A cluster the normalizer cannot bring to policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("worker shape is undetermined: no worker count and no autoscale range")]
    UnclassifiedWorkers,

    #[error("autoscale range has no max_workers")]
    MissingMaxWorkers,

    #[error("cluster has no display name to rebuild")]
    MissingClusterName,
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
