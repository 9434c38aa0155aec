use thiserror::Error;

use crate::filings::FilingError;
use crate::mapping::MappingError;
use crate::mindex::IndexError;
use crate::resolver::ResolverError;
use crate::storage::StorageError;

/// Result alias for operations returning the root error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type aggregating every domain error in the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("index operation failed: {0}")]
    Index(#[from] IndexError),

    #[error("mapping build failed: {0}")]
    Mapping(#[from] MappingError),

    #[error("filing ingestion failed: {0}")]
    Filing(#[from] FilingError),

    #[error("identifier resolution failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error("storage operation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("source fetch failed: {0}")]
    Source(#[from] SourceError),
}

/// Failure modes a source connector can report.
///
/// Connectors translate their transport-level errors into this shape so the
/// core never depends on an HTTP stack. Retry policy for transient failures
/// lives with the connectors; the core only decides fatal-vs-degraded.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failure: the endpoint was unreachable or answered with an
    /// unexpected status.
    #[error("network failure: {0}")]
    Network(String),

    /// The provider throttled the request.
    #[error("rate limited")]
    RateLimited,

    /// The payload arrived but could not be parsed into records.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// A connector-side cache failed.
    #[error("cache failure: {0}")]
    Cache(String),

    /// Building the per-source index failed structurally.
    #[error(transparent)]
    Index(#[from] IndexError),
}
