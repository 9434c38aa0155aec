//! Storage ports and the bundled backends.

pub(crate) mod local;
pub(crate) mod memory;
pub(crate) mod traits;

pub use local::LocalBlobStore;
pub use memory::MemoryStore;
pub use traits::{BlobStore, KeyValueStore, StorageError};
