//! Engine implementation backed by the ScyllaDB driver
//!
//! This module connects the facade to a ScyllaDB (or Cassandra) cluster
//! through the `scylla` crate. The driver owns connection pooling, node
//! discovery, paging and retries; this module only translates requests and
//! results.
//!
//! # Modules
//!
//! - `connection`: Defines parameters and methods for establishing
//!   connections to the cluster.
//! - `convert`: Converts between JSON values and CQL values.
//! - `engine`: Implements [`Engine`](crate::engine::Engine) on top of a
//!   caching session.
//! - `error`: Maps driver errors onto the crate error taxonomy.

// region:    --- Modules

mod connection;
mod convert;
mod engine;
mod error;

pub use connection::ConnectionParams;
pub use engine::ScyllaEngine;

pub use scylla::{client::caching_session::CachingSession, frame::Compression};

// endregion: --- Modules
