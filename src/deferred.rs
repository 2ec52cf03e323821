use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::task::JoinHandle;

use crate::{QueryResult, Result};

/// A query running in the background.
///
/// Returned by [`Cluster::query_deferred`](crate::Cluster::query_deferred)
/// before the engine round trip completes. Await it (or call
/// [`wait`](QueryHandle::wait)) to get the result; use
/// [`is_ready`](QueryHandle::is_ready) to check without waiting.
///
/// Dropping the handle does not cancel the query, its result is discarded.
#[derive(Debug)]
pub struct QueryHandle {
    client_context_id: String,
    task: JoinHandle<Result<QueryResult>>,
}

impl QueryHandle {
    pub(crate) fn new(client_context_id: String, task: JoinHandle<Result<QueryResult>>) -> Self {
        Self {
            client_context_id,
            task,
        }
    }

    pub fn client_context_id(&self) -> &str {
        &self.client_context_id
    }

    /// Whether the result is available. Never blocks.
    pub fn is_ready(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<QueryResult> {
        self.await
    }
}

impl Future for QueryHandle {
    type Output = Result<QueryResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => Poll::Ready(Err(err.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}
