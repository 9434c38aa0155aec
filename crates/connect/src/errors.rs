use thiserror::Error;

use tickerlink_core::storage::StorageError;
use tickerlink_core::{IndexError, SourceError};

/// Transport-level failures shared by every connector.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("http {status}: {message}")]
    Status { status: u16, message: String },

    #[error("rate limited")]
    RateLimited,

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cache failure: {0}")]
    Cache(#[from] StorageError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Flatten connector failures into the transport-agnostic shape the core
/// understands.
impl From<ConnectError> for SourceError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::RateLimited => SourceError::RateLimited,
            ConnectError::Network(e) => SourceError::Network(e.to_string()),
            ConnectError::Status { status, message } => {
                SourceError::Network(format!("http {status}: {message}"))
            }
            ConnectError::Malformed(m) => SourceError::Malformed(m),
            ConnectError::Archive(e) => SourceError::Malformed(e.to_string()),
            ConnectError::Csv(e) => SourceError::Malformed(e.to_string()),
            ConnectError::Cache(e) => SourceError::Cache(e.to_string()),
            ConnectError::Index(e) => SourceError::Index(e),
        }
    }
}
