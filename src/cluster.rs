use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use tracing::debug;
use uuid::Uuid;

use crate::{
    engine::{Engine, EngineRequest},
    Error, QueryHandle, QueryOptions, QueryResult, Result, RowStream, Statement,
};

#[cfg(feature = "scylla")]
use crate::scylla::{ConnectionParams, ScyllaEngine};

/// Lifecycle of a [`Cluster`]. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Connected,
    Closed,
}

#[derive(Debug)]
struct Inner {
    engine: Arc<dyn Engine>,
    closed: AtomicBool,
}

/// A logical session with the cluster.
///
/// Cloning is cheap and every clone shares the same session and state:
/// disconnecting one clone closes them all. The session itself is released
/// when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Cluster {
    inner: Arc<Inner>,
    defaults: QueryOptions,
}

// Constructors
impl Cluster {
    pub fn from_engine(engine: impl Engine + 'static) -> Self {
        Self::from_shared_engine(Arc::new(engine))
    }

    pub fn from_shared_engine(engine: Arc<dyn Engine>) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                closed: AtomicBool::new(false),
            }),
            defaults: QueryOptions::default(),
        }
    }

    /// Connects to `host` with plain-text credentials, using default
    /// [`ConnectionParams`] for everything else.
    #[cfg(feature = "scylla")]
    pub async fn connect(host: &str, username: &str, password: &str) -> Result<Self> {
        let params = ConnectionParams::new(host, username, password);
        Self::connect_with(&params).await
    }

    #[cfg(feature = "scylla")]
    pub async fn connect_with(params: &ConnectionParams) -> Result<Self> {
        let engine = ScyllaEngine::connect(params).await?;
        Ok(Self::from_engine(engine))
    }

    /// Options applied to every query made through this handle, unless the
    /// query sets them itself. Parameters are never inherited.
    pub fn with_options(mut self, options: impl Into<QueryOptions>) -> Self {
        self.defaults = options.into();
        self
    }
}

// State
impl Cluster {
    pub fn state(&self) -> ClusterState {
        if self.inner.closed.load(Ordering::Acquire) {
            ClusterState::Closed
        } else {
            ClusterState::Connected
        }
    }

    /// Moves the cluster to `Closed`. Later calls are no-ops.
    pub async fn disconnect(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        debug!("Disconnecting");
        self.inner.engine.close().await;
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.state() {
            ClusterState::Connected => Ok(()),
            state => Err(Error::InvalidState(state)),
        }
    }
}

// Buckets
impl Cluster {
    pub async fn bucket(&self, name: &str) -> Result<Bucket<'_>> {
        self.ensure_connected()?;

        if !self.inner.engine.bucket_exists(name).await? {
            return Err(Error::NotFound {
                bucket: name.to_string(),
            });
        }

        Ok(Bucket {
            cluster: self,
            name: name.to_string(),
        })
    }
}

// Queries
impl Cluster {
    /// Runs a statement and returns the complete result.
    pub async fn query(
        &self,
        statement: impl Into<Statement>,
        options: impl Into<QueryOptions>,
    ) -> Result<QueryResult> {
        let request = self.request(statement.into(), options.into())?;
        let client_context_id = request.client_context_id.clone();

        debug!("Query {}: {}", client_context_id, request.statement);

        let start = Instant::now();
        let rows = self.inner.engine.execute(request).await?;

        Ok(QueryResult::new(rows, client_context_id, start.elapsed()))
    }

    /// Starts a statement on a background task and returns at once.
    ///
    /// Must be called from within a tokio runtime. Every error, including
    /// parameter and state errors, is reported when the handle is awaited.
    pub fn query_deferred(
        &self,
        statement: impl Into<Statement>,
        options: impl Into<QueryOptions>,
    ) -> QueryHandle {
        let mut options = options.into();
        let client_context_id = options
            .client_context_id
            .get_or_insert_with(new_context_id)
            .clone();

        let statement = statement.into();
        let cluster = self.clone();

        debug!("Deferred query {}", client_context_id);

        let task = tokio::spawn(async move { cluster.query(statement, options).await });

        QueryHandle::new(client_context_id, task)
    }

    /// Runs a statement and returns its rows as a lazy stream.
    pub async fn query_stream(
        &self,
        statement: impl Into<Statement>,
        options: impl Into<QueryOptions>,
    ) -> Result<RowStream> {
        let request = self.request(statement.into(), options.into())?;
        let client_context_id = request.client_context_id.clone();

        debug!("Stream query {}: {}", client_context_id, request.statement);

        let rows = self.inner.engine.stream(request).await?;

        Ok(RowStream::new(rows, client_context_id))
    }

    fn request(&self, statement: Statement, options: QueryOptions) -> Result<EngineRequest> {
        self.ensure_connected()?;

        let options = options.or_defaults(&self.defaults);
        let parameters = options.parameters()?;
        let page_size = options.checked_page_size()?;
        statement.check(&parameters)?;

        Ok(EngineRequest {
            statement,
            parameters,
            consistency: options.consistency(),
            timeout: options.timeout,
            page_size,
            client_context_id: options.client_context_id.unwrap_or_else(new_context_id),
        })
    }
}

fn new_context_id() -> String {
    Uuid::new_v4().to_string()
}

/// A reference to a bucket (namespace), valid while its cluster is borrowed.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    cluster: &'a Cluster,
    name: String,
}

impl<'a> Bucket<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cluster(&self) -> &'a Cluster {
        self.cluster
    }
}
