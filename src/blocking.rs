//! A blocking facade over [`Cluster`](crate::Cluster).
//!
//! Every call blocks the calling thread until the engine answers. The facade
//! owns a multi-threaded tokio runtime, so it must not be used from inside
//! another runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use cluster_query::{blocking::Cluster, QueryOptions};
//!
//! fn main() -> cluster_query::Result<()> {
//!     let cluster = Cluster::connect("localhost", "username", "password")?;
//!
//!     let result = cluster.query("select * from `travel-sample` limit 10", QueryOptions::new())?;
//!     for row in result.rows() {
//!         println!("Row: {row:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::Runtime;

use crate::{
    Bucket, ClusterState, QueryHandle, QueryOptions, QueryResult, Result, Row, RowStream,
    Statement,
};

#[cfg(feature = "scylla")]
use crate::scylla::ConnectionParams;

#[derive(Debug, Clone)]
pub struct Cluster {
    inner: crate::Cluster,
    runtime: Arc<Runtime>,
}

impl Cluster {
    #[cfg(feature = "scylla")]
    pub fn connect(host: &str, username: &str, password: &str) -> Result<Self> {
        let params = ConnectionParams::new(host, username, password);
        Self::connect_with(&params)
    }

    #[cfg(feature = "scylla")]
    pub fn connect_with(params: &ConnectionParams) -> Result<Self> {
        let runtime = new_runtime()?;
        let inner = runtime.block_on(crate::Cluster::connect_with(params))?;

        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// Wraps an already connected async cluster.
    pub fn from_async(cluster: crate::Cluster) -> Result<Self> {
        Ok(Self {
            inner: cluster,
            runtime: Arc::new(new_runtime()?),
        })
    }

    pub fn as_async(&self) -> &crate::Cluster {
        &self.inner
    }

    pub fn state(&self) -> ClusterState {
        self.inner.state()
    }

    pub fn disconnect(&self) {
        self.runtime.block_on(self.inner.disconnect());
    }

    pub fn bucket(&self, name: &str) -> Result<Bucket<'_>> {
        self.runtime.block_on(self.inner.bucket(name))
    }

    /// Blocks until the complete result is available.
    pub fn query(
        &self,
        statement: impl Into<Statement>,
        options: impl Into<QueryOptions>,
    ) -> Result<QueryResult> {
        self.runtime.block_on(self.inner.query(statement, options))
    }

    /// Starts the query on the facade's runtime and returns at once.
    /// Collect the result with [`wait`](Cluster::wait).
    pub fn query_deferred(
        &self,
        statement: impl Into<Statement>,
        options: impl Into<QueryOptions>,
    ) -> QueryHandle {
        let _guard = self.runtime.enter();
        self.inner.query_deferred(statement, options)
    }

    /// Blocks until a deferred query finishes.
    pub fn wait(&self, handle: QueryHandle) -> Result<QueryResult> {
        self.runtime.block_on(handle)
    }

    /// Runs the query and returns an iterator that fetches rows on demand.
    pub fn query_stream(
        &self,
        statement: impl Into<Statement>,
        options: impl Into<QueryOptions>,
    ) -> Result<RowIter> {
        let stream = self
            .runtime
            .block_on(self.inner.query_stream(statement, options))?;

        Ok(RowIter {
            stream,
            runtime: self.runtime.clone(),
        })
    }
}

fn new_runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Blocking iterator over a [`RowStream`]. Each `next` blocks until the
/// engine yields the next row.
#[derive(Debug)]
pub struct RowIter {
    stream: RowStream,
    runtime: Arc<Runtime>,
}

impl RowIter {
    pub fn into_stream(self) -> RowStream {
        self.stream
    }
}

impl Iterator for RowIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
