mod common;

use std::sync::Arc;

use cluster_query::{Error, QueryOptions};
use common::{cluster, cluster_with, MockEngine};
use tokio::sync::Notify;

const STMT: &str = "select * from `travel-sample` where type=$type limit 5";

fn options() -> QueryOptions {
    QueryOptions::new().parameter("type", "airline")
}

#[tokio::test]
async fn test_deferred_returns_before_round_trip() -> anyhow::Result<()> {
    let gate = Arc::new(Notify::new());
    let (cluster, engine) = cluster_with(MockEngine::new().with_gate(gate.clone()));

    let handle = cluster.query_deferred(STMT, options());
    tokio::task::yield_now().await;

    assert!(!handle.is_ready());
    assert_eq!(engine.request_count(), 1);

    gate.notify_one();
    let deferred = handle.await?;

    gate.notify_one();
    let sync = cluster.query(STMT, options()).await?;

    assert_eq!(deferred.len(), 5);
    assert_eq!(deferred.rows(), sync.rows());

    Ok(())
}

#[tokio::test]
async fn test_is_ready_after_completion() -> anyhow::Result<()> {
    let (cluster, _) = cluster();

    let handle = cluster.query_deferred(STMT, options().client_context_id("deferred-1"));
    assert_eq!(handle.client_context_id(), "deferred-1");

    while !handle.is_ready() {
        tokio::task::yield_now().await;
    }

    let result = handle.wait().await?;
    assert_eq!(result.meta_data().client_context_id, "deferred-1");
    assert_eq!(result.len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_deferred_context_id_is_generated() -> anyhow::Result<()> {
    let (cluster, _) = cluster();

    let handle = cluster.query_deferred(STMT, options());
    let id = handle.client_context_id().to_string();
    assert!(!id.is_empty());

    let result = handle.await?;
    assert_eq!(result.meta_data().client_context_id, id);

    Ok(())
}

#[tokio::test]
async fn test_deferred_errors_surface_on_await() {
    let (cluster, _) = cluster();

    let err = cluster
        .query_deferred(STMT, QueryOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ParameterBinding(_)));

    let err = cluster
        .query_deferred("selct 1", QueryOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QueryExecution(_)));
}
