use crate::Error;

impl From<scylla::errors::NewSessionError> for Error {
    fn from(value: scylla::errors::NewSessionError) -> Self {
        Error::Connection(value.to_string())
    }
}

macro_rules! impl_from_execution_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Error {
                fn from(value: $ty) -> Self {
                    Error::execution(value)
                }
            }
        )*
    };
}

impl_from_execution_error!(
    scylla::errors::ExecutionError,
    scylla::errors::PagerExecutionError,
    scylla::errors::NextRowError,
    scylla::errors::IntoRowsResultError,
    scylla::errors::RowsError,
    scylla::errors::DeserializationError,
    scylla::errors::TypeCheckError,
);
