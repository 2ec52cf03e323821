//! The seam to the query engine.
//!
//! Everything the facade does not do itself (talking to the cluster,
//! substituting parameters, enforcing consistency) happens behind [`Engine`].
//! The `scylla` feature ships [`ScyllaEngine`](crate::scylla::ScyllaEngine);
//! any other backend, including test doubles, can be plugged in through
//! [`Cluster::from_engine`](crate::Cluster::from_engine).

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{Parameters, Result, Row, ScanConsistency, Statement};

/// Rows produced incrementally by an engine.
pub type EngineRows = BoxStream<'static, Result<Row>>;

/// A validated request handed to the engine.
///
/// `parameters` has already been checked against `statement` on a best-effort
/// basis; the engine remains the authority on whether it really fits.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub statement: Statement,
    pub parameters: Parameters,
    pub consistency: ScanConsistency,
    pub timeout: Option<Duration>,
    pub page_size: Option<i32>,
    pub client_context_id: String,
}

#[async_trait]
pub trait Engine: Send + Sync + Debug {
    /// Whether a bucket (namespace) with this name exists.
    async fn bucket_exists(&self, name: &str) -> Result<bool>;

    /// Executes the request and returns every row.
    async fn execute(&self, request: EngineRequest) -> Result<Vec<Row>>;

    /// Executes the request and yields rows as the engine produces them.
    ///
    /// Dropping the returned stream must release whatever it holds.
    async fn stream(&self, request: EngineRequest) -> Result<EngineRows>;

    /// Called once when the owning cluster is disconnected.
    async fn close(&self) {}
}
