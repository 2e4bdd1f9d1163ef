use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dataset load error: {0}")]
    DatasetLoad(String),

    #[error("Insufficient data: need {required} comparables, dataset has {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Who is responsible for an error, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request can be corrected and retried by the caller.
    Client,
    /// The requested resource does not exist.
    NotFound,
    /// Data or operational problem on the service side.
    Server,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidQuery(_) => ErrorKind::Client,
            Error::OrderNotFound(_) => ErrorKind::NotFound,
            Error::DatasetLoad(_)
            | Error::InsufficientData { .. }
            | Error::Repository(_)
            | Error::InvalidConfig(_) => ErrorKind::Server,
        }
    }

    /// Stable machine-readable tag used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DatasetLoad(_) => "dataset_load",
            Error::InsufficientData { .. } => "insufficient_data",
            Error::InvalidQuery(_) => "invalid_query",
            Error::OrderNotFound(_) => "order_not_found",
            Error::Repository(_) => "repository",
            Error::InvalidConfig(_) => "invalid_config",
        }
    }
}
