//! Core of the ticker mapping pipeline.
//!
//! The crate is organized around one data structure and its consumers:
//!
//! - [`mindex`]: the multi-key indexed record store every pipeline stage
//!   builds on.
//! - [`identifiers`]: normalization and derivation of financial
//!   identifiers (tickers, CIKs, ISIN check digits).
//! - [`mapping`]: source ports and the precedence-chain builder producing
//!   the unified ticker mapping.
//! - [`resolver`]: point lookups from any identifier to a ticker.
//! - [`filings`]: 13F and Form 4 ingestion on top of the mapping.
//! - [`storage`]: key-value and blob storage ports with local backends.
//!
//! Network connectors implementing the source ports live in the companion
//! connect crate; this crate never talks to the network itself.

pub mod errors;
pub mod filings;
pub mod identifiers;
pub mod mapping;
pub mod mindex;
pub mod resolver;
pub mod storage;

pub use errors::{Error, Result, SourceError};
pub use mindex::{IndexError, IndexedRecord, MultiIndex, Record};
