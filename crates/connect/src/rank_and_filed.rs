//! Aggregator connector for the pipe-delimited EDGAR extracts: ticker/CIK
//! rows, CIK-keyed LEIs, and the SIC-to-NAICS classification table.

use async_trait::async_trait;
use csv::ReaderBuilder;
use log::debug;

use tickerlink_core::identifiers::{normalize_cik, normalize_ticker};
use tickerlink_core::mapping::{AggregatorSource, SourceIndex};
use tickerlink_core::{Record, SourceError};

use crate::client::ApiClient;
use crate::errors::ConnectError;

const BASE_URL: &str = "http://rankandfiled.com/static/export/";

pub struct RankAndFiledConnector {
    client: ApiClient,
}

impl RankAndFiledConnector {
    pub fn new() -> Self {
        Self {
            client: ApiClient::new(),
        }
    }

    async fn fetch_csv(&self, file: &str) -> Result<String, ConnectError> {
        self.client.get_text(&format!("{BASE_URL}{file}")).await
    }
}

impl Default for RankAndFiledConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AggregatorSource for RankAndFiledConnector {
    fn id(&self) -> &'static str {
        "rankandfiled"
    }

    async fn fetch_tickers(&self) -> Result<SourceIndex, SourceError> {
        let text = self.fetch_csv("cik_ticker.csv").await?;
        parse_ticker_table(&text).map_err(Into::into)
    }

    async fn fetch_leis(&self) -> Result<SourceIndex, SourceError> {
        let text = self.fetch_csv("cik_lei.csv").await?;
        parse_lei_table(&text).map_err(Into::into)
    }

    async fn fetch_industries(&self) -> Result<SourceIndex, SourceError> {
        let text = self.fetch_csv("sic_naics.csv").await?;
        parse_industry_table(&text).map_err(Into::into)
    }
}

fn pipe_reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// `CIK|Ticker|Name|Exchange|SIC|Business|Incorporated|IRS`. OTC listings
/// are excluded: their tickers recycle and collide with listed symbols.
fn parse_ticker_table(text: &str) -> Result<SourceIndex, ConnectError> {
    let mut index = SourceIndex::safe(["ticker"], "ticker")?;
    for result in pipe_reader(text).records() {
        let row = result?;
        let (Some(raw_cik), Some(raw_ticker), Some(name), Some(exchange)) =
            (row.get(0), row.get(1), row.get(2), row.get(3))
        else {
            continue;
        };
        if name.is_empty() || exchange.is_empty() || exchange.starts_with("OTC") {
            continue;
        }
        let (Some(ticker), Some(cik)) = (normalize_ticker(raw_ticker), normalize_cik(raw_cik))
        else {
            continue;
        };
        let mut record = Record::new()
            .with("ticker", ticker)
            .with("cik", cik)
            .with("name", name);
        if let Some(sic) = row.get(4).filter(|s| !s.is_empty()) {
            record.set("sic", sic);
        }
        if let Some(irs) = row.get(7).filter(|s| !s.is_empty()) {
            record.set("irs_number", irs);
        }
        if let Err(err) = index.insert(record) {
            debug!("aggregator ticker row skipped: {err}");
        }
    }
    Ok(index)
}

/// `CIK|Name|LEI|Legal form`, keyed by CIK.
fn parse_lei_table(text: &str) -> Result<SourceIndex, ConnectError> {
    let mut index = SourceIndex::safe(["cik"], "cik")?;
    for result in pipe_reader(text).records() {
        let row = result?;
        let (Some(raw_cik), Some(name), Some(lei)) = (row.get(0), row.get(1), row.get(2))
        else {
            continue;
        };
        if name.is_empty() || lei.is_empty() {
            continue;
        }
        let Some(cik) = normalize_cik(raw_cik) else {
            continue;
        };
        let record = Record::new()
            .with("cik", cik)
            .with("name", name)
            .with("lei", lei);
        if let Err(err) = index.insert(record) {
            debug!("aggregator lei row skipped: {err}");
        }
    }
    Ok(index)
}

/// `SIC|SIC classification|NAICS|NAICS classification`, keyed by SIC.
fn parse_industry_table(text: &str) -> Result<SourceIndex, ConnectError> {
    let mut index = SourceIndex::safe(["sic"], "sic")?;
    for result in pipe_reader(text).records() {
        let row = result?;
        let Some(sic) = row.get(0).filter(|s| !s.is_empty()) else {
            continue;
        };
        let mut record = Record::new().with("sic", sic);
        let fields = [
            ("sic_classification", row.get(1)),
            ("naics", row.get(2)),
            ("naics_classification", row.get(3)),
        ];
        for (key, value) in fields {
            if let Some(value) = value.filter(|s| !s.is_empty()) {
                record.set(key, value);
            }
        }
        if let Err(err) = index.insert(record) {
            debug!("industry row skipped: {err}");
        }
    }
    Ok(index)
}
