use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mindex::{IndexError, IndexedRecord, MultiIndex};

/// Index keys of the unified ticker mapping: every identifier field that is
/// unique per entity. `ticker` is the default key; all others are optional
/// per record (safe mode).
pub const MAPPING_INDEX_KEYS: [&str; 8] = [
    "ticker",
    "cusip",
    "cik",
    "figi",
    "isin",
    "lei",
    "bloomberg_gid",
    "irs_number",
];

/// Construct an empty mapping index with the canonical key configuration.
pub fn mapping_index() -> Result<MultiIndex<TickerMappingRecord>, IndexError> {
    MultiIndex::safe(MAPPING_INDEX_KEYS, "ticker")
}

/// One reconciled entity in the unified ticker mapping.
///
/// `ticker` and `name` are mandatory; every other identifier is present only
/// when some source supplied it (never a placeholder). `isin` is always
/// derived from `cusip` plus the locale country code, never sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMappingRecord {
    pub ticker: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cusip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cik: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloomberg_gid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irs_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<TickerDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<IndustryInfo>,
}

impl TickerMappingRecord {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            cusip: None,
            cik: None,
            figi: None,
            isin: None,
            lei: None,
            bloomberg_gid: None,
            irs_number: None,
            locale: None,
            asset_class: None,
            currency_code: None,
            last_updated: None,
            details: None,
            exchange: None,
            industry: None,
        }
    }
}

impl IndexedRecord for TickerMappingRecord {
    fn index_value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "ticker" => Some(self.ticker.as_str()),
            "cusip" => self.cusip.as_deref(),
            "cik" => self.cik.as_deref(),
            "figi" => self.figi.as_deref(),
            "isin" => self.isin.as_deref(),
            "lei" => self.lei.as_deref(),
            "bloomberg_gid" => self.bloomberg_gid.as_deref(),
            "irs_number" => self.irs_number.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Vendor company metadata attached to a mapping record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Exchange metadata resolved through the MIC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub mic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tape_id: Option<String>,
}

/// SIC / NAICS industry classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndustryInfo {
    pub sic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sic_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naics_classification: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_values_cover_identifier_fields_only() {
        let mut record = TickerMappingRecord::new("AAPL", "Apple Inc.");
        record.cusip = Some("037833100".into());
        record.locale = Some("US".into());

        assert_eq!(record.index_value("ticker"), Some("AAPL"));
        assert_eq!(record.index_value("cusip"), Some("037833100"));
        assert_eq!(record.index_value("cik"), None);
        // Descriptive fields never act as index keys.
        assert_eq!(record.index_value("locale"), None);
        assert_eq!(record.index_value("name"), None);
    }

    #[test]
    fn test_absent_identifiers_are_omitted_from_json() {
        let record = TickerMappingRecord::new("AAPL", "Apple Inc.");
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("cusip"));
        assert!(!object.contains_key("isin"));
        assert_eq!(object.get("ticker").and_then(|v| v.as_str()), Some("AAPL"));
    }

    #[test]
    fn test_mapping_index_config() {
        let index = mapping_index().unwrap();
        assert!(index.safe_mode());
        assert_eq!(index.default_index_key(), Some("ticker"));
        assert_eq!(index.index_keys().len(), MAPPING_INDEX_KEYS.len());
    }
}
