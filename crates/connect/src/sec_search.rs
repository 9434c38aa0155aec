//! Filing search connector over the SEC full-text query API: cursor-paged
//! 13F holdings reports and Form 4 insider filings.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use tickerlink_core::filings::{
    FilingPage, FilingSource, Form4Filing, Holding, OwnershipTransaction, ThirteenFFiling,
};
use tickerlink_core::SourceError;

use crate::client::ApiClient;
use crate::errors::ConnectError;

const QUERY_URL: &str = "https://api.sec-api.io";
const PAGE_SIZE: &str = "200";
/// Window start when no cursor has been stored yet.
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

pub struct SecSearchConnector {
    client: ApiClient,
    api_token: String,
}

impl SecSearchConnector {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(),
            api_token: api_token.into(),
        }
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        form_type: &str,
        from: Option<&str>,
    ) -> Result<T, ConnectError> {
        let window_start = match from {
            Some(cursor) => cursor.to_string(),
            None => (Utc::now() - Duration::days(DEFAULT_LOOKBACK_DAYS)).to_rfc3339(),
        };
        let window_end = Utc::now().to_rfc3339();
        let body = json!({
            "query": {
                "query_string": {
                    "query": format!(
                        "formType:\"{form_type}\" AND filedAt:{{{window_start} TO {window_end}}}"
                    )
                }
            },
            "from": "0",
            "size": PAGE_SIZE,
            "sort": [{"filedAt": {"order": "asc"}}]
        });
        self.client
            .post_json(QUERY_URL, &[("token", self.api_token.as_str())], &body)
            .await
    }
}

#[async_trait]
impl FilingSource for SecSearchConnector {
    fn id(&self) -> &'static str {
        "sec-search"
    }

    async fn fetch_thirteen_f(
        &self,
        from: Option<&str>,
    ) -> Result<FilingPage<ThirteenFFiling>, SourceError> {
        let response: QueryResponse<RawThirteenF> =
            self.query("13F", from).await.map_err(SourceError::from)?;
        let next_from = page_cursor(from, response.filings.last().map(|f| f.filed_at.as_str()));

        let mut filings = Vec::with_capacity(response.filings.len());
        for raw in response.filings {
            match clean_thirteen_f(raw) {
                Some(filing) => filings.push(filing),
                None => warn!("dropped a 13F filing with an unparseable timestamp"),
            }
        }
        debug!("sec-search: {} 13F filings", filings.len());
        Ok(FilingPage { filings, next_from })
    }

    async fn fetch_form4(
        &self,
        from: Option<&str>,
    ) -> Result<FilingPage<Form4Filing>, SourceError> {
        let response: QueryResponse<RawForm4> =
            self.query("4", from).await.map_err(SourceError::from)?;
        let next_from = page_cursor(from, response.filings.last().map(|f| f.filed_at.as_str()));

        let mut filings = Vec::with_capacity(response.filings.len());
        for raw in response.filings {
            match clean_form4(raw) {
                Some(filing) => filings.push(filing),
                None => warn!("dropped a Form 4 filing with an unparseable timestamp"),
            }
        }
        debug!("sec-search: {} Form 4 filings", filings.len());
        Ok(FilingPage { filings, next_from })
    }
}

/// Cursor for the next page: the last filing's timestamp. A page that
/// fails to advance the cursor ends pagination, otherwise an interval
/// denser than one page would loop forever.
fn page_cursor(previous: Option<&str>, last_filed_at: Option<&str>) -> Option<String> {
    let last = last_filed_at?;
    if previous == Some(last) {
        return None;
    }
    Some(last.to_string())
}

fn filing_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn clean_thirteen_f(raw: RawThirteenF) -> Option<ThirteenFFiling> {
    let filed_at = DateTime::<FixedOffset>::parse_from_rfc3339(&raw.filed_at).ok()?;
    let holdings = raw
        .holdings
        .into_iter()
        .map(|h| Holding {
            issuer_name: h.name_of_issuer,
            cusip: h.cusip,
            ticker: None,
            class_title: h.title_of_class,
            // Reported in thousands of dollars.
            value: (h.value * 1000.0).round() as i64,
            shares: h.shrs_or_prn_amt.ssh_prnamt.round() as i64,
            put_call: h.put_call,
            investment_discretion: h.investment_discretion,
        })
        .collect();
    Some(ThirteenFFiling {
        id: filing_id(),
        accession_no: raw.accession_no,
        cik: raw.cik,
        company_name: raw.company_name,
        ticker: raw.ticker.filter(|t| !t.is_empty()),
        period_of_report: raw.period_of_report,
        filed_at,
        holdings,
    })
}

fn clean_form4(raw: RawForm4) -> Option<Form4Filing> {
    let filed_at = DateTime::<FixedOffset>::parse_from_rfc3339(&raw.filed_at).ok()?;
    let transactions = raw
        .non_derivative_table
        .map(|table| {
            table
                .transactions
                .into_iter()
                .map(|t| OwnershipTransaction {
                    code: t.coding.code,
                    date: t.transaction_date,
                    shares: t.amounts.shares,
                    price_per_share: t.amounts.price_per_share,
                    acquired: t.amounts.acquired_disposed_code == "A",
                })
                .collect()
        })
        .unwrap_or_default();
    Some(Form4Filing {
        id: filing_id(),
        issuer_cik: raw.issuer.cik,
        issuer_name: raw.issuer.name,
        ticker: raw.issuer.trading_symbol,
        owner_name: raw.reporting_owner.name,
        owner_title: raw
            .reporting_owner
            .relationship
            .and_then(|r| r.officer_title),
        filed_at,
        transactions,
    })
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    filings: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawThirteenF {
    accession_no: String,
    cik: String,
    company_name: String,
    #[serde(default)]
    ticker: Option<String>,
    period_of_report: String,
    filed_at: String,
    #[serde(default)]
    holdings: Vec<RawHolding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHolding {
    name_of_issuer: String,
    cusip: String,
    #[serde(default)]
    title_of_class: Option<String>,
    value: f64,
    shrs_or_prn_amt: RawShares,
    #[serde(default)]
    put_call: Option<String>,
    #[serde(default)]
    investment_discretion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShares {
    ssh_prnamt: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawForm4 {
    filed_at: String,
    issuer: RawIssuer,
    reporting_owner: RawOwner,
    #[serde(default)]
    non_derivative_table: Option<RawTransactionTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIssuer {
    cik: String,
    name: String,
    #[serde(default)]
    trading_symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOwner {
    name: String,
    #[serde(default)]
    relationship: Option<RawRelationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationship {
    #[serde(default)]
    officer_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransactionTable {
    #[serde(default)]
    transactions: Vec<RawTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    coding: RawCoding,
    transaction_date: String,
    amounts: RawAmounts,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoding {
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAmounts {
    shares: f64,
    #[serde(default)]
    price_per_share: Option<f64>,
    acquired_disposed_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_thirteen_f_scales_values_and_keeps_cusips() {
        let raw: RawThirteenF = serde_json::from_value(serde_json::json!({
            "accessionNo": "0000950123-24-011775",
            "cik": "1067983",
            "companyName": "BERKSHIRE HATHAWAY INC",
            "ticker": "BRK-B",
            "periodOfReport": "2024-09-30",
            "filedAt": "2024-11-14T16:01:22-05:00",
            "holdings": [{
                "nameOfIssuer": "APPLE INC",
                "cusip": "037833100",
                "titleOfClass": "COM",
                "value": 69900000.0,
                "shrsOrPrnAmt": {"sshPrnamt": 300000000.0, "sshPrnamtType": "SH"},
                "investmentDiscretion": "DFND"
            }]
        }))
        .unwrap();

        let filing = clean_thirteen_f(raw).unwrap();
        assert_eq!(filing.cik, "1067983");
        assert_eq!(filing.accession_no, "0000950123-24-011775");
        assert_eq!(filing.ticker.as_deref(), Some("BRK-B"));
        assert_eq!(filing.holdings.len(), 1);
        assert_eq!(filing.holdings[0].value, 69_900_000_000);
        assert_eq!(filing.holdings[0].shares, 300_000_000);
        assert_eq!(filing.holdings[0].cusip, "037833100");
        assert!(filing.holdings[0].ticker.is_none());
        assert!(!filing.id.is_empty());
    }

    #[test]
    fn test_clean_thirteen_f_rejects_bad_timestamp() {
        let raw: RawThirteenF = serde_json::from_value(serde_json::json!({
            "accessionNo": "0000000000-24-000001",
            "cik": "1",
            "companyName": "X",
            "periodOfReport": "2024-09-30",
            "filedAt": "yesterday"
        }))
        .unwrap();
        assert!(clean_thirteen_f(raw).is_none());
    }

    #[test]
    fn test_clean_form4_maps_transactions() {
        let raw: RawForm4 = serde_json::from_value(serde_json::json!({
            "filedAt": "2024-10-03T18:31:09-04:00",
            "issuer": {"cik": "320193", "name": "Apple Inc.", "tradingSymbol": "AAPL"},
            "reportingOwner": {
                "name": "COOK TIMOTHY D",
                "relationship": {"isOfficer": true, "officerTitle": "Chief Executive Officer"}
            },
            "nonDerivativeTable": {
                "transactions": [{
                    "coding": {"code": "S"},
                    "transactionDate": "2024-10-02",
                    "amounts": {
                        "shares": 223986.0,
                        "pricePerShare": 225.91,
                        "acquiredDisposedCode": "D"
                    }
                }]
            }
        }))
        .unwrap();

        let filing = clean_form4(raw).unwrap();
        assert_eq!(filing.issuer_cik, "320193");
        assert_eq!(filing.ticker.as_deref(), Some("AAPL"));
        assert_eq!(
            filing.owner_title.as_deref(),
            Some("Chief Executive Officer")
        );
        assert_eq!(filing.transactions.len(), 1);
        assert!(!filing.transactions[0].acquired);
        assert_eq!(filing.transactions[0].price_per_share, Some(225.91));
    }

    #[test]
    fn test_page_cursor_stops_when_it_cannot_advance() {
        assert_eq!(page_cursor(None, None), None);
        assert_eq!(
            page_cursor(None, Some("2024-10-03T18:31:09-04:00")).as_deref(),
            Some("2024-10-03T18:31:09-04:00")
        );
        assert_eq!(
            page_cursor(
                Some("2024-10-03T18:31:09-04:00"),
                Some("2024-10-03T18:31:09-04:00")
            ),
            None
        );
    }
}
