//! Lazy row streams.
//!
//! [`RowStream`] is what [`Cluster::query_stream`](crate::Cluster::query_stream)
//! returns. Rows are pulled from the engine one at a time, so the consumer may
//! interleave its own processing with delivery and stop whenever it likes:
//! dropping the stream releases the engine cursor without draining it.
//!
//! An engine error is always the last item. Rows delivered before it stay
//! delivered; whether they are usable is up to the caller.
//!
//! [`PagedRows`] wraps a `RowStream` to hand out rows a page at a time
//! through the [`Pagable`] trait.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cluster_query::{Cluster, Pagable, QueryOptions};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = Cluster::connect("localhost", "username", "password").await?;
//!
//! let mut rows = cluster
//!     .query_stream("select * from `travel-sample`", QueryOptions::new())
//!     .await?;
//!
//! // Only the first few rows are fetched.
//! for _ in 0..3 {
//!     match rows.next().await {
//!         Some(Ok(row)) => println!("{row:?}"),
//!         Some(Err(err)) => eprintln!("Error: {err}"),
//!         None => break,
//!     }
//! }
//!
//! // Or page by page.
//! let stream = cluster
//!     .query_stream("select * from `travel-sample`", QueryOptions::new())
//!     .await?;
//! let mut pages = stream.paged(10);
//! while let Some(page) = pages.next_page().await {
//!     println!("{} rows", page.len());
//! }
//! if let Some(err) = pages.take_error() {
//!     eprintln!("Error: {err}");
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::{stream::FusedStream, Stream, StreamExt};
use tracing::debug;

use crate::{engine::EngineRows, Error, Pagable, Result, Row};

/// A lazy, finite, forward-only sequence of rows.
pub struct RowStream {
    inner: Option<EngineRows>,
    client_context_id: String,
    delivered: usize,
}

impl RowStream {
    pub(crate) fn new(inner: EngineRows, client_context_id: String) -> Self {
        Self {
            inner: Some(inner),
            client_context_id,
            delivered: 0,
        }
    }

    pub fn client_context_id(&self) -> &str {
        &self.client_context_id
    }

    /// Rows handed out so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Drains the stream, failing on the first error.
    pub async fn try_collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Wraps the stream to consume it `per_page` rows at a time. A
    /// `per_page` of zero is treated as one.
    pub fn paged(self, per_page: usize) -> PagedRows {
        PagedRows::new(self, per_page)
    }
}

impl Stream for RowStream {
    type Item = Result<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(row))) => {
                this.delivered += 1;
                Poll::Ready(Some(Ok(row)))
            }
            Poll::Ready(Some(Err(err))) => {
                debug!(
                    "Stream {} failed after {} rows",
                    this.client_context_id, this.delivered
                );
                this.inner = None;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedStream for RowStream {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        if self.inner.is_some() {
            debug!(
                "Stream {} dropped early after {} rows",
                self.client_context_id, self.delivered
            );
        }
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream")
            .field("client_context_id", &self.client_context_id)
            .field("delivered", &self.delivered)
            .field("terminated", &self.inner.is_none())
            .finish()
    }
}

/// A paginated view over a [`RowStream`].
///
/// # Fields
///
/// - `stream`: The underlying row stream.
/// - `per_page`: The number of rows per page.
/// - `page_items`: The rows of the current page.
/// - `error`: The error that ended the stream, if any.
pub struct PagedRows {
    stream: RowStream,
    per_page: usize,
    page_items: Vec<Row>,
    error: Option<Error>,
}

impl PagedRows {
    /// Pages hold at least one row; `per_page` of zero is raised to one.
    pub fn new(stream: RowStream, per_page: usize) -> Self {
        let per_page = per_page.max(1);

        Self {
            stream,
            per_page,
            page_items: Vec::with_capacity(per_page),
            error: None,
        }
    }

    /// The error that terminated the stream, if one did.
    ///
    /// A page returned right before the error holds the rows delivered
    /// before it.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    async fn pull(&mut self) -> Option<Row> {
        match self.stream.next().await {
            Some(Ok(row)) => Some(row),
            Some(Err(err)) => {
                self.error = Some(err);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl Pagable<Row> for PagedRows {
    async fn next_page(&mut self) -> Option<&[Row]> {
        self.page_items.clear();

        for _ in 0..self.per_page {
            match self.pull().await {
                Some(row) => self.page_items.push(row),
                None => break,
            }
        }

        if self.page_items.is_empty() {
            None
        } else {
            Some(self.page_items())
        }
    }

    async fn skip_page(&mut self) {
        self.page_items.clear();

        for _ in 0..self.per_page {
            if self.pull().await.is_none() {
                break;
            }
        }
    }

    #[inline]
    fn page_items(&self) -> &[Row] {
        &self.page_items
    }
}
