//! `cluster_query` is a small facade for running queries against a database cluster.
//! It takes care of option construction, parameter validation and result shaping, and
//! leaves execution to an [`engine::Engine`]. The default `scylla` feature provides an
//! engine backed by the ScyllaDB driver.
//!
//! Results can be consumed three ways:
//!
//! - [`Cluster::query`] returns the complete [`QueryResult`] (or
//!   [`blocking::Cluster::query`] if the calling thread should block).
//! - [`Cluster::query_deferred`] returns a [`QueryHandle`] right away.
//! - [`Cluster::query_stream`] returns a lazy [`RowStream`].
//!
//! # Example
//!
//! ```rust,no_run
//! use cluster_query::{Cluster, QueryOptions, ScanConsistency};
//!
//! #[tokio::main]
//! async fn main() -> cluster_query::Result<()> {
//!     let cluster = Cluster::connect("localhost", "username", "password").await?;
//!     let bucket = cluster.bucket("travel-sample").await?;
//!     println!("Using {}", bucket.name());
//!
//!     let result = cluster
//!         .query(
//!             "select * from `travel-sample` where type=$type and country=$country limit 10",
//!             QueryOptions::new()
//!                 .parameter("type", "airline")
//!                 .parameter("country", "United States")
//!                 .scan_consistency(ScanConsistency::RequestPlus),
//!         )
//!         .await?;
//!
//!     for row in result.rows() {
//!         println!("Row: {row:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```

// region:    --- Modules

use async_trait::async_trait;

mod cluster;
mod deferred;
mod error;
mod options;
mod result;
mod statement;
mod stream;

pub mod blocking;
pub mod engine;

#[cfg(feature = "scylla")]
pub mod scylla;

pub use cluster::{Bucket, Cluster, ClusterState};
pub use deferred::QueryHandle;
pub use error::{Error, Result};
pub use options::{QueryOptions, ScanConsistency};
pub use result::{QueryMetaData, QueryResult, Row};
pub use statement::{Parameters, Placeholder, Statement};
pub use stream::{PagedRows, RowStream};

// endregion: --- Modules

/// Trait for paginating through a stream.
///
/// This trait provides methods to fetch the next page of items and skip
/// pages in the stream. It requires the item type to be `Send` and `Sync` for
/// safe concurrent access.
///
/// # Methods
///
/// - `next_page`: Fetches the next page of items from the stream.
/// - `skip_page`: Skips the current page in the stream without retrieving items.
/// - `skip_pages`: Skips `page_count` pages in the stream without retrieving items.
/// - `page_items`: Returns the items of the current page.
#[async_trait]
pub trait Pagable<E>
where
    E: Send + Sync,
{
    /// Fetches the next page of items from the stream.
    ///
    /// This method clears the current page items and attempts to fill the vector
    /// with the next set of items from the stream. If no items are available,
    /// it returns `None`.
    async fn next_page(&mut self) -> Option<&[E]>;

    /// Skips the current page in the stream.
    async fn skip_page(&mut self);

    /// Skips `page_count` pages in the stream.
    async fn skip_pages(&mut self, page_count: usize) {
        for _ in 0..page_count {
            self.skip_page().await;
        }
    }

    /// Returns the items of the current page.
    fn page_items(&self) -> &[E];
}
