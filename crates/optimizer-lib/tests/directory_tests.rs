//! Integration tests for the HTTP cluster directory

use mockito::{Matcher, Server};
use optimizer_lib::{
    ApplyMode, ClusterDirectory, ClusterStatus, DirectoryError, HttpDirectory, PolicyParameters,
    Reconciler, RenameToggle, Scope, WorkspaceContext,
};
use serde_json::json;

const TOKEN: &str = "dapi-test-token";

fn directory(server: &Server, principal: Option<&str>) -> HttpDirectory {
    let context = WorkspaceContext::new(
        &server.url(),
        principal.map(str::to_string),
        Some(TOKEN.to_string()),
    )
    .unwrap();
    HttpDirectory::new(context).unwrap()
}

fn list_body() -> String {
    json!({
        "clusters": [
            {"cluster_id": "c-1", "creator_user_name": "me@corp.com", "cluster_name": "team-prod-x"},
            {"cluster_id": "c-2", "creator_user_name": "other@corp.com", "cluster_name": "ops"},
            {"cluster_id": "c-3", "cluster_name": "orphan"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_list_all_clusters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/2.0/clusters/list")
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(list_body())
        .create_async()
        .await;

    let ids = directory(&server, None)
        .list_clusters(Scope::All)
        .await
        .unwrap();

    assert_eq!(ids, vec!["c-1", "c-2", "c-3"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_mine_filters_by_creator() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/2.0/clusters/list")
        .with_status(200)
        .with_body(list_body())
        .create_async()
        .await;

    let ids = directory(&server, Some("me@corp.com"))
        .list_clusters(Scope::Mine)
        .await
        .unwrap();

    assert_eq!(ids, vec!["c-1"]);
}

#[tokio::test]
async fn test_empty_workspace_lists_nothing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/2.0/clusters/list")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let ids = directory(&server, None)
        .list_clusters(Scope::All)
        .await
        .unwrap();

    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_get_projects_recognized_attributes() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/2.0/clusters/get")
        .match_query(Matcher::UrlEncoded("cluster_id".into(), "c-1".into()))
        .with_status(200)
        .with_body(
            json!({
                "cluster_id": "c-1",
                "cluster_name": "team-prod-x",
                "num_workers": 0,
                "state": "TERMINATED",
                "spark_version": "10.4.x-scala2.12",
                "single_user_name": "",
                "default_tags": {"Vendor": "Databricks"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = directory(&server, None)
        .get_cluster_config("c-1")
        .await
        .unwrap();

    assert_eq!(config.cluster_name.as_deref(), Some("team-prod-x"));
    assert_eq!(config.num_workers, Some(0));
    assert!(config.single_user_name.is_none());
    let map = config.to_map().unwrap();
    assert!(!map.contains_key("state"));
    assert!(!map.contains_key("default_tags"));
}

#[tokio::test]
async fn test_api_error_carries_status_and_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/2.0/clusters/get")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error_code":"PERMISSION_DENIED"}"#)
        .create_async()
        .await;

    let err = directory(&server, None)
        .get_cluster_config("c-1")
        .await
        .unwrap_err();

    match err {
        DirectoryError::Api { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("PERMISSION_DENIED"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_posts_full_config_with_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/2.0/clusters/edit")
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .match_body(Matcher::Json(json!({
            "cluster_id": "c-1",
            "cluster_name": "team-Standard-0-dev",
            "num_workers": 0,
            "autotermination_minutes": 30
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let config = optimizer_lib::ClusterConfig {
        cluster_name: Some("team-Standard-0-dev".to_string()),
        num_workers: Some(0),
        autotermination_minutes: Some(30),
        ..Default::default()
    };

    directory(&server, None)
        .update_cluster_config("c-1", &config)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_reconcile_over_http_updates_only_changed_clusters() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/2.0/clusters/list")
        .with_status(200)
        .with_body(
            json!({"clusters": [
                {"cluster_id": "stale"},
                {"cluster_id": "compliant"},
                {"cluster_id": "job"}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/2.0/clusters/get")
        .match_query(Matcher::UrlEncoded("cluster_id".into(), "stale".into()))
        .with_status(200)
        .with_body(
            json!({
                "cluster_id": "stale",
                "cluster_name": "team-prod-x",
                "num_workers": 8,
                "spark_version": "13.0.x-cpu-ml-scala2.12",
                "autotermination_minutes": 120
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/2.0/clusters/get")
        .match_query(Matcher::UrlEncoded("cluster_id".into(), "compliant".into()))
        .with_status(200)
        .with_body(
            json!({
                "cluster_id": "compliant",
                "cluster_name": "team-Standard-0-dev",
                "num_workers": 0,
                "spark_version": "10.4.x-scala2.12",
                "spark_conf": {"spark.databricks.cluster.profile": "singleNode"},
                "custom_tags": {"Type": "Standard", "Workers": "SingleNode"},
                "autotermination_minutes": 20
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/api/2.0/clusters/get")
        .match_query(Matcher::UrlEncoded("cluster_id".into(), "job".into()))
        .with_status(200)
        .with_body(
            json!({
                "cluster_id": "job",
                "cluster_name": "job-123-run-1",
                "num_workers": 2,
                "cluster_source": "JOB"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let edit = server
        .mock("POST", "/api/2.0/clusters/edit")
        .match_body(Matcher::PartialJson(json!({
            "cluster_id": "stale",
            "cluster_name": "team-AI-1_8-dev",
            "autoscale": {"min_workers": 1, "max_workers": 8, "target_workers": 1},
            "autotermination_minutes": 20
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let policy =
        PolicyParameters::new(Scope::All, ApplyMode::Update, RenameToggle::On, 20).unwrap();
    let reconciler = Reconciler::new(directory(&server, None), policy).unwrap();

    let report = reconciler.run().await.unwrap();

    edit.assert_async().await;
    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(
        report.outcome("stale").unwrap().status,
        ClusterStatus::Updated { .. }
    ));
    assert_eq!(
        report.outcome("compliant").unwrap().status,
        ClusterStatus::Unchanged
    );
    assert!(report.outcome("job").is_none());
}
