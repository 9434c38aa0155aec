use thiserror::Error;

use crate::errors::SourceError;
use crate::mindex::IndexError;
use crate::resolver::ResolverError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum FilingError {
    #[error("filing source failed: {0}")]
    Source(#[from] SourceError),

    #[error("filing storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("ticker resolution failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("filing serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("corrupt ingest manifest: {0}")]
    Manifest(String),
}
