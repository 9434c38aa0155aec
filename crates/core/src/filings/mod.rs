//! Regulatory filing ingestion: 13F holdings reports and Form 4 insider
//! transactions.

pub(crate) mod errors;
pub(crate) mod ingest;
pub(crate) mod model;
pub(crate) mod normalize;
pub(crate) mod traits;

pub use errors::FilingError;
pub use ingest::{Form4Ingestor, IngestManifest, IngestReport, ThirteenFIngestor};
pub use model::{FilingPage, Form4Filing, Holding, OwnershipTransaction, ThirteenFFiling};
pub use normalize::normalize_holdings;
pub use traits::FilingSource;
