//! Multi-key indexed record store.
//!
//! The backbone of every data-loading pipeline in this workspace: source
//! connectors return their raw rows as a [`MultiIndex`] of schema-less
//! [`Record`]s, and the mapping builder joins them into one [`MultiIndex`]
//! of typed records addressable by any identifier.

pub(crate) mod errors;
pub(crate) mod index;
pub(crate) mod record;

pub use errors::IndexError;
pub use index::MultiIndex;
pub use record::{IndexedRecord, Record};
