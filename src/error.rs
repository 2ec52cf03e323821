use derive_more::derive::From;

use crate::ClusterState;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the query facade.
///
/// The facade recovers nothing locally. Engine failures are carried as
/// opaque messages, binding problems found before dispatch are reported as
/// `ParameterBinding`.
///
/// # Variants
///
/// - `Connection` - The endpoint is unreachable or the credentials were rejected.
/// - `NotFound` - The referenced bucket does not exist.
/// - `ParameterBinding` - Parameters do not fit the statement placeholders.
/// - `QueryExecution` - Any failure reported by the engine while executing.
/// - `InvalidOption` - A query option is out of range.
/// - `InvalidState` - The cluster handle was already closed.
/// - `Runtime` - The blocking facade could not build its runtime.
/// - `Join` - A deferred query task panicked or was aborted.
#[derive(Debug, From)]
pub enum Error {
    Connection(String),

    NotFound {
        bucket: String,
    },

    ParameterBinding(String),

    QueryExecution(String),

    InvalidOption(String),

    InvalidState(ClusterState),

    #[from]
    Runtime(std::io::Error),

    #[from]
    Join(tokio::task::JoinError),
}

impl Error {
    pub(crate) fn binding(msg: impl Into<String>) -> Self {
        Self::ParameterBinding(msg.into())
    }

    pub(crate) fn execution(msg: impl ToString) -> Self {
        Self::QueryExecution(msg.to_string())
    }
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
