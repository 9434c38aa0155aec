use thiserror::Error;

use crate::errors::SourceError;
use crate::mindex::IndexError;

/// Errors produced while building the unified ticker mapping.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A required source could not be fetched. The build fails fast: a
    /// mapping with a silently absent source would corrupt downstream
    /// precedence decisions.
    #[error("source '{source}' unavailable: {cause}")]
    SourceUnavailable {
        source: &'static str,
        #[source]
        cause: SourceError,
    },

    #[error(transparent)]
    Index(#[from] IndexError),
}
