//! Network connectors implementing the core's source ports.
//!
//! One module per provider, each translating its wire format into the
//! record indexes the mapping builder joins:
//!
//! - [`polygon`]: vendor ticker universe, reference details, exchanges,
//!   and the CUSIP point lookup.
//! - [`sec_gov`]: EDGAR company CIKs and the fails-to-deliver CUSIP table.
//! - [`rank_and_filed`]: aggregator ticker, LEI, and industry extracts.
//! - [`gleif`]: the ISIN-to-LEI golden-copy relationship file.
//! - [`sec_search`]: cursor-paged 13F and Form 4 filing queries.

pub mod client;
pub mod errors;
pub mod gleif;
pub mod polygon;
pub mod rank_and_filed;
pub mod ratelimit;
pub mod sec_gov;
pub mod sec_search;

pub use client::ApiClient;
pub use errors::ConnectError;
pub use gleif::GleifConnector;
pub use polygon::{PolygonConnector, PolygonTickerResolver};
pub use rank_and_filed::RankAndFiledConnector;
pub use ratelimit::RateLimiter;
pub use sec_gov::SecGovConnector;
pub use sec_search::SecSearchConnector;
