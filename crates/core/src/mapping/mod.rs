//! Unified ticker mapping: source ports, the precedence-chain builder, and
//! the fetch-then-build orchestrator.

pub(crate) mod builder;
pub(crate) mod coverage;
pub(crate) mod errors;
pub(crate) mod model;
pub(crate) mod service;
pub(crate) mod traits;

pub use builder::{build_ticker_mapping, MappingSources};
pub use coverage::IdentifierCoverage;
pub use errors::MappingError;
pub use model::{
    mapping_index, ExchangeInfo, IndustryInfo, TickerDetails, TickerMappingRecord,
    MAPPING_INDEX_KEYS,
};
pub use service::MappingService;
pub use traits::{
    AggregatorSource, LeiSource, RegistrySource, SourceIndex, TickerUniverseSource,
};
