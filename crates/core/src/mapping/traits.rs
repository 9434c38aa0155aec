use async_trait::async_trait;

use crate::errors::SourceError;
use crate::mindex::{MultiIndex, Record};

/// Result shape shared by every source fetch: a per-source index of raw
/// rows, keyed the way that source naturally keys its data.
pub type SourceIndex = MultiIndex<Record>;

/// Market-data vendor exposing the ticker universe and per-ticker detail
/// and exchange endpoints.
#[async_trait]
pub trait TickerUniverseSource: Send + Sync {
    /// Stable identifier used in logs and error reports.
    fn id(&self) -> &'static str;

    /// The full active ticker universe, indexed by ticker (and any other
    /// identifier the vendor supplies, such as FIGI or CUSIP).
    async fn fetch_tickers(&self) -> Result<SourceIndex, SourceError>;

    /// Detailed reference data for the given tickers, indexed by ticker.
    async fn fetch_ticker_details(&self, tickers: &[String]) -> Result<SourceIndex, SourceError>;

    /// Exchange reference data, indexed by MIC.
    async fn fetch_exchanges(&self) -> Result<SourceIndex, SourceError>;
}

/// Government registry publishing ticker-to-CIK and CUSIP-to-ticker tables.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    fn id(&self) -> &'static str;

    /// Registered companies, indexed by ticker, each row carrying a CIK.
    async fn fetch_ciks(&self) -> Result<SourceIndex, SourceError>;

    /// CUSIP-bearing rows, indexed by ticker.
    async fn fetch_cusips(&self) -> Result<SourceIndex, SourceError>;
}

/// Third-party aggregator with ticker, LEI and industry-classification
/// tables keyed by ticker or CIK.
#[async_trait]
pub trait AggregatorSource: Send + Sync {
    fn id(&self) -> &'static str;

    /// Ticker rows (with CIK, SIC, IRS number), indexed by ticker.
    async fn fetch_tickers(&self) -> Result<SourceIndex, SourceError>;

    /// LEI rows, indexed by CIK.
    async fn fetch_leis(&self) -> Result<SourceIndex, SourceError>;

    /// SIC-to-NAICS classification rows, indexed by SIC code.
    async fn fetch_industries(&self) -> Result<SourceIndex, SourceError>;
}

/// Legal-entity registry publishing ISIN-to-LEI relationship files.
#[async_trait]
pub trait LeiSource: Send + Sync {
    fn id(&self) -> &'static str;

    /// LEI relationship rows, indexed by ISIN.
    async fn fetch_leis(&self) -> Result<SourceIndex, SourceError>;
}
