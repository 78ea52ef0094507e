//! REST client for the workspace clusters API

use super::{async_trait, ClusterDirectory, WorkspaceContext};
use crate::error::{DirectoryError, OptimizeError};
use crate::models::{ClusterConfig, ClusterSummary};
use crate::policy::Scope;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const LIST_PATH: &str = "api/2.0/clusters/list";
const GET_PATH: &str = "api/2.0/clusters/get";
const EDIT_PATH: &str = "api/2.0/clusters/edit";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
struct ClusterList {
    #[serde(default)]
    clusters: Vec<ClusterSummary>,
}

#[derive(Serialize)]
struct GetQuery<'a> {
    cluster_id: &'a str,
}

/// Cluster directory backed by the workspace REST API
pub struct HttpDirectory {
    client: Client,
    context: WorkspaceContext,
}

impl HttpDirectory {
    pub fn new(context: WorkspaceContext) -> Result<Self, OptimizeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(DirectoryError::from)?;

        Ok(Self { client, context })
    }

    pub fn context(&self) -> &WorkspaceContext {
        &self.context
    }

    async fn get_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, DirectoryError> {
        let url = self.context.host().join(path)?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.context.token())
            .query(query)
            .send()
            .await?;

        let body = check_status(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn check_status(response: Response) -> Result<Response, DirectoryError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(DirectoryError::Api { status, body })
}

#[async_trait]
impl ClusterDirectory for HttpDirectory {
    async fn list_clusters(&self, scope: Scope) -> Result<Vec<String>, DirectoryError> {
        let list: ClusterList = self.get_json(LIST_PATH, &[] as &[(&str, &str)]).await?;

        let ids = list
            .clusters
            .into_iter()
            .filter(|summary| match scope {
                Scope::All => true,
                Scope::Mine => {
                    summary.creator_user_name.is_some()
                        && summary.creator_user_name.as_deref() == self.context.principal()
                }
            })
            .map(|summary| summary.cluster_id)
            .collect();

        Ok(ids)
    }

    async fn get_cluster_config(&self, cluster_id: &str) -> Result<ClusterConfig, DirectoryError> {
        let raw: Value = self.get_json(GET_PATH, &GetQuery { cluster_id }).await?;
        Ok(ClusterConfig::project(raw)?)
    }

    async fn update_cluster_config(
        &self,
        cluster_id: &str,
        config: &ClusterConfig,
    ) -> Result<(), DirectoryError> {
        let url = self.context.host().join(EDIT_PATH)?;
        debug!(url = %url, cluster_id = %cluster_id, "POST");

        let mut payload = config.clone();
        payload.cluster_id = Some(cluster_id.to_string());

        let response = self
            .client
            .post(url)
            .bearer_auth(self.context.token())
            .json(&payload)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
