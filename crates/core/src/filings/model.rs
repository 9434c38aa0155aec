use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::mindex::IndexedRecord;

/// One holding row from a 13F information table.
///
/// `value` is in whole dollars (filings report thousands; sources scale on
/// ingest). `ticker` starts empty and is filled by CUSIP resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub issuer_name: String,
    pub cusip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_title: Option<String>,
    pub value: i64,
    pub shares: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_call: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_discretion: Option<String>,
}

impl IndexedRecord for Holding {
    fn index_value(&self, key: &str) -> Option<&str> {
        match key {
            "cusip" => Some(self.cusip.as_str()).filter(|v| !v.is_empty()),
            _ => None,
        }
    }
}

/// A quarterly 13F holdings report by an institutional manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirteenFFiling {
    pub id: String,
    pub accession_no: String,
    pub cik: String,
    pub company_name: String,
    /// The manager's own ticker, when it is a listed company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// Reporting period, `YYYY-MM-DD`.
    pub period_of_report: String,
    pub filed_at: DateTime<FixedOffset>,
    pub holdings: Vec<Holding>,
}

/// An insider ownership-change filing (Form 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form4Filing {
    pub id: String,
    pub issuer_cik: String,
    pub issuer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_title: Option<String>,
    pub filed_at: DateTime<FixedOffset>,
    pub transactions: Vec<OwnershipTransaction>,
}

/// One non-derivative transaction row from a Form 4 table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipTransaction {
    /// Transaction code (`P` purchase, `S` sale, ...).
    pub code: String,
    /// Transaction date, `YYYY-MM-DD`.
    pub date: String,
    pub shares: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_share: Option<f64>,
    pub acquired: bool,
}

/// One page of filings from a search backend, oldest first, with the
/// cursor to resume from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingPage<T> {
    pub filings: Vec<T>,
    /// Pass back as `from` to fetch the next page; `None` when exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_from: Option<String>,
}
