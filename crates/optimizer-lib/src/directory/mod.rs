//! Access to the control plane's cluster directory
//!
//! The reconciler only needs three calls: list identifiers, fetch one
//! configuration, and submit a full desired configuration. [`HttpDirectory`]
//! implements them against the workspace REST API.

mod http;

pub use http::HttpDirectory;

use crate::error::{DirectoryError, OptimizeError};
use crate::models::ClusterConfig;
use crate::policy::Scope;
use url::Url;

pub use async_trait::async_trait;

/// Operations the reconciler consumes from the control plane
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// List cluster identifiers visible under `scope`
    async fn list_clusters(&self, scope: Scope) -> Result<Vec<String>, DirectoryError>;

    /// Fetch one cluster, projected onto the recognized attributes
    async fn get_cluster_config(&self, cluster_id: &str) -> Result<ClusterConfig, DirectoryError>;

    /// Replace a cluster's configuration with `config`
    async fn update_cluster_config(
        &self,
        cluster_id: &str,
        config: &ClusterConfig,
    ) -> Result<(), DirectoryError>;
}

/// Identity and endpoint a run talks to
#[derive(Clone)]
pub struct WorkspaceContext {
    host: Url,
    principal: Option<String>,
    token: String,
}

impl WorkspaceContext {
    /// Validate the workspace endpoint and credential.
    ///
    /// A host without a scheme is treated as `https://<host>`.
    pub fn new(
        host: &str,
        principal: Option<String>,
        token: Option<String>,
    ) -> Result<Self, OptimizeError> {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                OptimizeError::Credential(
                    "API token is missing, set the DATABRICKS_API_TOKEN environment variable"
                        .to_string(),
                )
            })?;

        let host = host.trim();
        if host.is_empty() {
            return Err(OptimizeError::Configuration(
                "workspace host is not set".to_string(),
            ));
        }
        let with_scheme = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        let host = Url::parse(&with_scheme).map_err(|e| {
            OptimizeError::Configuration(format!("invalid workspace host '{}': {}", host, e))
        })?;

        Ok(Self {
            host,
            principal: principal.filter(|p| !p.trim().is_empty()),
            token,
        })
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Scope `mine` needs a principal to filter on
    pub fn check_scope(&self, scope: Scope) -> Result<(), OptimizeError> {
        if scope == Scope::Mine && self.principal.is_none() {
            return Err(OptimizeError::Configuration(
                "scope 'mine' requires a principal, set DATABRICKS_USER or --principal"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for WorkspaceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceContext")
            .field("host", &self.host.as_str())
            .field("principal", &self.principal)
            .field("token", &"<redacted>")
            .finish()
    }
}
