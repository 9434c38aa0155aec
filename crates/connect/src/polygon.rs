//! Market-data vendor connector: ticker universe, per-ticker reference
//! details, exchanges, and the CUSIP-to-ticker point lookup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use tickerlink_core::identifiers::normalize_ticker;
use tickerlink_core::mapping::{SourceIndex, TickerUniverseSource};
use tickerlink_core::resolver::{ResolverError, TickerResolver};
use tickerlink_core::storage::KeyValueStore;
use tickerlink_core::{Record, SourceError};

use crate::client::ApiClient;
use crate::errors::ConnectError;
use crate::ratelimit::RateLimiter;

const BASE_URL: &str = "https://api.polygon.io/v3/reference";
const PAGE_LIMIT: &str = "1000";
/// Hard cap on cursor follow-ups; the stock universe fits well within it
/// and a longer chain means the cursor is broken.
const MAX_PAGES: usize = 15;
const CUSIP_CACHE_NAMESPACE: &str = "polygon:cusip";
const CUSIP_CACHE_TTL_DAYS: i64 = 30;

pub struct PolygonConnector {
    client: ApiClient,
    api_key: String,
    limiter: RateLimiter,
    cache: Option<Arc<dyn KeyValueStore>>,
}

impl PolygonConnector {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(),
            api_key: api_key.into(),
            limiter: RateLimiter::new(300, 10.0),
            cache: None,
        }
    }

    /// Memoize CUSIP lookups across runs; misses are cached too.
    pub fn with_cache(mut self, cache: Arc<dyn KeyValueStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn fetch_universe(&self) -> Result<SourceIndex, ConnectError> {
        let mut index = SourceIndex::safe(["ticker"], "ticker")?;
        let mut page: TickersPage = self
            .client
            .get_json(
                &format!("{BASE_URL}/tickers"),
                &[
                    ("apiKey", self.api_key.as_str()),
                    ("market", "stocks"),
                    ("type", "CS"),
                    ("active", "true"),
                    ("limit", PAGE_LIMIT),
                ],
            )
            .await?;

        let mut pages = 1;
        loop {
            for row in page.results {
                let Some(record) = universe_record(row) else {
                    continue;
                };
                if let Err(err) = index.insert(record) {
                    debug!("universe row skipped: {err}");
                }
            }
            let Some(next_url) = page.next_url else {
                break;
            };
            if pages >= MAX_PAGES {
                return Err(ConnectError::Malformed(format!(
                    "ticker cursor did not terminate within {MAX_PAGES} pages"
                )));
            }
            page = self.client.get_json_bearer(&next_url, &self.api_key).await?;
            pages += 1;
        }

        debug!("polygon universe: {} tickers over {pages} pages", index.len());
        Ok(index)
    }

    async fn fetch_details(&self, tickers: &[String]) -> Result<SourceIndex, ConnectError> {
        let mut index = SourceIndex::safe(["ticker"], "ticker")?;
        for ticker in tickers {
            self.limiter.acquire().await;
            let url = format!("{BASE_URL}/tickers/{ticker}");
            let response: Result<DetailsResponse, ConnectError> = self
                .client
                .get_json(&url, &[("apiKey", self.api_key.as_str())])
                .await;
            let details = match response {
                Ok(response) => response.results,
                Err(ConnectError::Status { status: 404, .. }) => {
                    debug!("no reference details for '{ticker}'");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if let Err(err) = index.insert(details_record(ticker, details)) {
                debug!("details row skipped: {err}");
            }
        }
        Ok(index)
    }

    async fn fetch_exchange_table(&self) -> Result<SourceIndex, ConnectError> {
        let response: ExchangesResponse = self
            .client
            .get_json(
                &format!("{BASE_URL}/exchanges"),
                &[
                    ("apiKey", self.api_key.as_str()),
                    ("asset_class", "stocks"),
                ],
            )
            .await?;

        let mut index = SourceIndex::safe(["mic"], "mic")?;
        for row in response.results {
            let Some(record) = exchange_record(row) else {
                continue;
            };
            if let Err(err) = index.insert(record) {
                debug!("exchange row skipped: {err}");
            }
        }
        Ok(index)
    }

    /// Resolve a CUSIP to its primary ticker through the reference search
    /// endpoint. `Ok(None)` means the vendor does not know the CUSIP; both
    /// hits and misses are cached.
    pub async fn lookup_ticker_by_cusip(
        &self,
        cusip: &str,
    ) -> Result<Option<String>, ConnectError> {
        if let Some(cache) = &self.cache {
            if let Some(value) = cache.get(CUSIP_CACHE_NAMESPACE, cusip).await? {
                let cached = value
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                return Ok(cached);
            }
        }

        self.limiter.acquire().await;
        let page: TickersPage = self
            .client
            .get_json(
                &format!("{BASE_URL}/tickers"),
                &[
                    ("apiKey", self.api_key.as_str()),
                    ("cusip", cusip),
                    ("limit", "1"),
                ],
            )
            .await?;
        let ticker = page
            .results
            .first()
            .and_then(|row| normalize_ticker(&row.ticker));

        if let Some(cache) = &self.cache {
            cache
                .put(
                    CUSIP_CACHE_NAMESPACE,
                    cusip,
                    Value::String(ticker.clone().unwrap_or_default()),
                    Some(Duration::days(CUSIP_CACHE_TTL_DAYS)),
                )
                .await?;
        }
        Ok(ticker)
    }
}

#[async_trait]
impl TickerUniverseSource for PolygonConnector {
    fn id(&self) -> &'static str {
        "polygon"
    }

    async fn fetch_tickers(&self) -> Result<SourceIndex, SourceError> {
        self.fetch_universe().await.map_err(Into::into)
    }

    async fn fetch_ticker_details(&self, tickers: &[String]) -> Result<SourceIndex, SourceError> {
        self.fetch_details(tickers).await.map_err(Into::into)
    }

    async fn fetch_exchanges(&self) -> Result<SourceIndex, SourceError> {
        self.fetch_exchange_table().await.map_err(Into::into)
    }
}

/// Network-backed resolver for CUSIPs the built mapping does not cover.
pub struct PolygonTickerResolver {
    connector: Arc<PolygonConnector>,
}

impl PolygonTickerResolver {
    pub fn new(connector: Arc<PolygonConnector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl TickerResolver for PolygonTickerResolver {
    fn id(&self) -> &'static str {
        "polygon"
    }

    async fn resolve_cusip(&self, cusip: &str) -> Result<Option<String>, ResolverError> {
        self.connector
            .lookup_ticker_by_cusip(cusip)
            .await
            .map_err(|err| {
                warn!("cusip lookup failed for '{cusip}': {err}");
                ResolverError::Source(err.into())
            })
    }

    async fn resolve_cik(&self, _cik: &str) -> Result<Option<String>, ResolverError> {
        // The vendor has no CIK search endpoint.
        Ok(None)
    }
}

fn universe_record(row: TickerRow) -> Option<Record> {
    let ticker = normalize_ticker(&row.ticker)?;
    let mut record = Record::new().with("ticker", ticker);
    let fields = [
        ("name", row.name),
        ("locale", row.locale),
        ("primary_exchange", row.primary_exchange),
        ("currency_name", row.currency_name),
        ("composite_figi", row.composite_figi),
        ("share_class_figi", row.share_class_figi),
        ("type", row.kind),
        ("last_updated_utc", row.last_updated_utc),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            record.set(key, value);
        }
    }
    Some(record)
}

fn details_record(ticker: &str, details: DetailsRow) -> Record {
    let mut record = Record::new().with("ticker", ticker);
    let address = details.address.as_ref().and_then(|a| {
        let parts: Vec<&str> = [a.address1.as_deref(), a.city.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    });
    let fields = [
        ("name", details.name),
        ("cusip", details.cusip),
        ("cik", details.cik),
        ("composite_figi", details.composite_figi),
        ("share_class_figi", details.share_class_figi),
        ("sic_code", details.sic_code),
        ("sector", details.sic_description),
        ("list_date", details.list_date),
        ("homepage_url", details.homepage_url),
        ("description", details.description),
        ("phone", details.phone_number),
        ("address", address),
        ("state", details.address.as_ref().and_then(|a| a.state.clone())),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            record.set(key, value);
        }
    }
    if let Some(employees) = details.total_employees {
        record.set("total_employees", employees);
    }
    record
}

fn exchange_record(row: ExchangeRow) -> Option<Record> {
    let mut record = Record::new().with("mic", row.mic?);
    let fields = [
        ("name", row.name),
        ("type", row.kind),
        ("market", row.market),
        ("tape_id", row.tape),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            record.set(key, value);
        }
    }
    Some(record)
}

#[derive(Debug, Deserialize)]
struct TickersPage {
    #[serde(default)]
    results: Vec<TickerRow>,
    #[serde(default)]
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerRow {
    ticker: String,
    name: Option<String>,
    locale: Option<String>,
    primary_exchange: Option<String>,
    currency_name: Option<String>,
    composite_figi: Option<String>,
    share_class_figi: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    last_updated_utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    results: DetailsRow,
}

#[derive(Debug, Deserialize)]
struct DetailsRow {
    name: Option<String>,
    cusip: Option<String>,
    cik: Option<String>,
    composite_figi: Option<String>,
    share_class_figi: Option<String>,
    sic_code: Option<String>,
    sic_description: Option<String>,
    total_employees: Option<u64>,
    list_date: Option<String>,
    homepage_url: Option<String>,
    description: Option<String>,
    phone_number: Option<String>,
    address: Option<DetailsAddress>,
}

#[derive(Debug, Deserialize)]
struct DetailsAddress {
    address1: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangesResponse {
    #[serde(default)]
    results: Vec<ExchangeRow>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRow {
    mic: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    market: Option<String>,
    tape: Option<String>,
}
