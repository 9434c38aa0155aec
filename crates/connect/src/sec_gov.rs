//! SEC EDGAR registry connector: the company ticker/CIK table and the
//! CUSIP-bearing fails-to-deliver archive.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use log::debug;
use serde::Deserialize;
use zip::ZipArchive;

use tickerlink_core::identifiers::{normalize_cik, normalize_ticker};
use tickerlink_core::mapping::{RegistrySource, SourceIndex};
use tickerlink_core::{Record, SourceError};

use crate::client::ApiClient;
use crate::errors::ConnectError;

const BASE_URL: &str = "https://www.sec.gov/files/";
/// Fails-to-deliver archives publish with a lag; reach back far enough
/// that the first half-month file is guaranteed to exist.
const FAILS_LAG_DAYS: i64 = 90;

pub struct SecGovConnector {
    client: ApiClient,
}

impl SecGovConnector {
    pub fn new() -> Self {
        Self {
            client: ApiClient::new(),
        }
    }

    async fn fetch_company_ciks(&self) -> Result<SourceIndex, ConnectError> {
        let url = format!("{BASE_URL}company_tickers.json");
        let companies: HashMap<String, CompanyRow> = self.client.get_json(&url, &[]).await?;

        let mut index = SourceIndex::safe(["ticker"], "ticker")?;
        for row in companies.into_values() {
            let Some(ticker) = normalize_ticker(&row.ticker) else {
                continue;
            };
            let Some(cik) = normalize_cik(&row.cik_str.to_string()) else {
                continue;
            };
            let record = Record::new()
                .with("ticker", ticker)
                .with("cik", cik)
                .with("name", row.title);
            if let Err(err) = index.insert(record) {
                debug!("cik row skipped: {err}");
            }
        }
        debug!("sec.gov ciks: {} tickers", index.len());
        Ok(index)
    }

    async fn fetch_fails_cusips(&self) -> Result<SourceIndex, ConnectError> {
        let period = fails_period(Utc::now().date_naive());
        let url = format!("{BASE_URL}data/fails-deliver-data/cnsfails{period}a.zip");
        let bytes = self.client.get_bytes(&url).await?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entry = archive.by_index(0)?;
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|err| ConnectError::Malformed(format!("fails archive: {err}")))?;

        parse_fails_table(&text)
    }
}

impl Default for SecGovConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrySource for SecGovConnector {
    fn id(&self) -> &'static str {
        "sec.gov"
    }

    async fn fetch_ciks(&self) -> Result<SourceIndex, SourceError> {
        self.fetch_company_ciks().await.map_err(Into::into)
    }

    async fn fetch_cusips(&self) -> Result<SourceIndex, SourceError> {
        self.fetch_fails_cusips().await.map_err(Into::into)
    }
}

/// `YYYYMM` of the fails-to-deliver archive to request as of `today`.
fn fails_period(today: NaiveDate) -> String {
    let target = today - Duration::days(FAILS_LAG_DAYS);
    format!("{:04}{:02}", target.year(), target.month())
}

/// Parse the pipe-delimited fails-to-deliver table. The first line is a
/// header and the final two lines are a trailer.
fn parse_fails_table(text: &str) -> Result<SourceIndex, ConnectError> {
    let lines: Vec<&str> = text.lines().collect();
    let body = lines
        .get(1..lines.len().saturating_sub(2))
        .unwrap_or_default();

    let mut index = SourceIndex::safe(["ticker"], "ticker")?;
    for line in body {
        let fields: Vec<&str> = line.split('|').collect();
        let (Some(cusip), Some(raw_ticker), Some(name)) =
            (fields.get(1), fields.get(2), fields.get(4))
        else {
            continue;
        };
        let Some(ticker) = normalize_ticker(raw_ticker) else {
            continue;
        };
        if cusip.is_empty() {
            continue;
        }
        let record = Record::new()
            .with("ticker", ticker)
            .with("cusip", *cusip)
            .with("name", *name);
        // The table repeats a ticker per settlement date; keep the first.
        let _ = index.insert(record);
    }
    Ok(index)
}

#[derive(Debug, Deserialize)]
struct CompanyRow {
    cik_str: u64,
    ticker: String,
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_tickers_payload_parses() {
        let payload = r#"{
            "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
            "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}
        }"#;
        let companies: HashMap<String, CompanyRow> = serde_json::from_str(payload).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies["0"].cik_str, 320193);
    }

    #[test]
    fn test_fails_period_reaches_back_past_the_publication_lag() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 14).unwrap();
        assert_eq!(fails_period(date), "202408");
    }

    #[test]
    fn test_fails_table_parses_header_body_trailer() {
        let text = "SETTLEMENT DATE|CUSIP|SYMBOL|QUANTITY (FAILS)|DESCRIPTION|PRICE\n\
                    20240902|037833100|AAPL|1200|APPLE INC|228.55\n\
                    20240903|037833100|AAPL|900|APPLE INC|229.10\n\
                    20240902|594918104|MSFT|50|MICROSOFT CORP|410.10\n\
                    20240902|||||\n\
                    Trailer record count: 3\n";

        let index = parse_fails_table(text).unwrap();
        // Duplicate AAPL settlement dates collapse to one row; the blank
        // and trailer lines never make it in.
        assert_eq!(index.len(), 2);
        let apple = index.get("ticker", Some("AAPL")).unwrap().unwrap();
        assert_eq!(apple.get_str("cusip"), Some("037833100"));
        assert_eq!(apple.get_str("name"), Some("APPLE INC"));
        assert!(index.get("ticker", Some("MSFT")).unwrap().is_some());
    }

    #[test]
    fn test_fails_table_skips_bad_tickers() {
        let text = "HEADER\n\
                    20240902|123456789|lowercase|1|SOMETHING|1.0\n\
                    20240902||NOCUSIP|1|SOMETHING|1.0\n\
                    20240902|594918104|MSFT|50|MICROSOFT CORP|410.10\n\
                    x\n\
                    y\n";
        let index = parse_fails_table(text).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get("ticker", Some("MSFT")).unwrap().is_some());
    }
}
