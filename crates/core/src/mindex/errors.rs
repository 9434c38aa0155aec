use thiserror::Error;

/// Errors raised by [`MultiIndex`](super::MultiIndex) operations.
///
/// Structural errors are always surfaced to the caller; the index never
/// silently drops or overwrites conflicting data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The index was constructed with invalid parameters. Caller bug.
    #[error("invalid index configuration: {0}")]
    Config(String),

    /// An inserted record's value for an index key is already taken by
    /// another live record.
    #[error("collision on index key '{key}' (value '{value}')")]
    Collision { key: String, value: String },

    /// An inserted record is missing a required index key.
    #[error("record is missing required index key '{key}'")]
    IncompleteRecord { key: String },

    /// A lookup or removal used a key that is not part of the index.
    #[error("'{0}' is not an index key")]
    InvalidKey(String),

    /// A strict-mode lookup or a removal found no record for the value.
    #[error("no record with {key} = '{value}'")]
    NotFound { key: String, value: String },
}
