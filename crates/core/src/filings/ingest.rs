//! Incremental filing ingestion.
//!
//! Each ingestor drains its backend page by page, normalizes and
//! ticker-resolves every filing, and persists the result through the blob
//! store. The cursor survives restarts in a small manifest blob, so a rerun
//! resumes where the previous run stopped instead of refetching history.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::filings::errors::FilingError;
use crate::filings::model::{Form4Filing, ThirteenFFiling};
use crate::filings::normalize::normalize_holdings;
use crate::filings::traits::FilingSource;
use crate::resolver::TickerResolver;
use crate::storage::BlobStore;

/// Persisted ingest cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestManifest {
    /// Cursor for the next fetch; `None` means start from the beginning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_from: Option<String>,
}

/// Outcome of one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub pages: usize,
    pub filings_stored: usize,
}

async fn load_manifest(
    store: &dyn BlobStore,
    path: &str,
) -> Result<IngestManifest, FilingError> {
    match store.read(path).await? {
        None => Ok(IngestManifest::default()),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|err| FilingError::Manifest(format!("{path}: {err}"))),
    }
}

async fn save_manifest(
    store: &dyn BlobStore,
    path: &str,
    manifest: &IngestManifest,
) -> Result<(), FilingError> {
    let bytes = serde_json::to_vec_pretty(manifest)?;
    store.write(path, &bytes).await?;
    Ok(())
}

/// Ingests quarterly 13F holdings reports.
pub struct ThirteenFIngestor {
    source: Arc<dyn FilingSource>,
    store: Arc<dyn BlobStore>,
    resolver: Arc<dyn TickerResolver>,
}

impl ThirteenFIngestor {
    const MANIFEST_PATH: &'static str = "13f/manifest.json";

    pub fn new(
        source: Arc<dyn FilingSource>,
        store: Arc<dyn BlobStore>,
        resolver: Arc<dyn TickerResolver>,
    ) -> Self {
        Self {
            source,
            store,
            resolver,
        }
    }

    /// Fetch and persist up to `max_pages` pages, resuming from the stored
    /// cursor. The manifest is advanced after each fully persisted page, so
    /// an abort mid-run loses at most the page in flight.
    pub async fn run(&self, max_pages: usize) -> Result<IngestReport, FilingError> {
        let mut manifest = load_manifest(self.store.as_ref(), Self::MANIFEST_PATH).await?;
        let mut report = IngestReport::default();

        for _ in 0..max_pages {
            let page = self
                .source
                .fetch_thirteen_f(manifest.fetch_from.as_deref())
                .await?;
            if page.filings.is_empty() {
                break;
            }
            report.pages += 1;

            for filing in page.filings {
                let filing = self.normalize(filing).await?;
                let path = format!("13f/{}/{}.json", filing.cik, filing.period_of_report);
                self.store
                    .write(&path, &serde_json::to_vec_pretty(&filing)?)
                    .await?;
                debug!("stored 13F {} ({} holdings)", path, filing.holdings.len());
                report.filings_stored += 1;
            }

            let done = page.next_from.is_none();
            if let Some(next) = page.next_from {
                manifest.fetch_from = Some(next);
            }
            save_manifest(self.store.as_ref(), Self::MANIFEST_PATH, &manifest).await?;
            if done {
                break;
            }
        }

        info!(
            "13F ingest: {} filings over {} pages",
            report.filings_stored, report.pages
        );
        Ok(report)
    }

    /// Merge duplicate holdings and fill tickers from the CUSIPs. A
    /// resolver failure leaves the ticker empty rather than dropping the
    /// holding.
    async fn normalize(&self, mut filing: ThirteenFFiling) -> Result<ThirteenFFiling, FilingError> {
        filing.holdings = normalize_holdings(filing.holdings)?;
        for holding in &mut filing.holdings {
            if holding.ticker.is_some() || holding.cusip.is_empty() {
                continue;
            }
            match self.resolver.resolve_cusip(&holding.cusip).await {
                Ok(ticker) => holding.ticker = ticker,
                Err(err) => {
                    warn!("cusip '{}' unresolved: {err}", holding.cusip);
                }
            }
        }
        Ok(filing)
    }
}

/// Ingests insider ownership-change filings (Form 4).
pub struct Form4Ingestor {
    source: Arc<dyn FilingSource>,
    store: Arc<dyn BlobStore>,
    resolver: Arc<dyn TickerResolver>,
}

impl Form4Ingestor {
    const MANIFEST_PATH: &'static str = "form4/manifest.json";

    pub fn new(
        source: Arc<dyn FilingSource>,
        store: Arc<dyn BlobStore>,
        resolver: Arc<dyn TickerResolver>,
    ) -> Self {
        Self {
            source,
            store,
            resolver,
        }
    }

    pub async fn run(&self, max_pages: usize) -> Result<IngestReport, FilingError> {
        let mut manifest = load_manifest(self.store.as_ref(), Self::MANIFEST_PATH).await?;
        let mut report = IngestReport::default();

        for _ in 0..max_pages {
            let page = self
                .source
                .fetch_form4(manifest.fetch_from.as_deref())
                .await?;
            if page.filings.is_empty() {
                break;
            }
            report.pages += 1;

            for mut filing in page.filings {
                if filing.ticker.is_none() {
                    match self.resolver.resolve_cik(&filing.issuer_cik).await {
                        Ok(ticker) => filing.ticker = ticker,
                        Err(err) => {
                            warn!("cik '{}' unresolved: {err}", filing.issuer_cik);
                        }
                    }
                }
                let path = format!("form4/{}/{}.json", filing.issuer_cik, filing.id);
                self.store
                    .write(&path, &serde_json::to_vec_pretty(&filing)?)
                    .await?;
                report.filings_stored += 1;
            }

            let done = page.next_from.is_none();
            if let Some(next) = page.next_from {
                manifest.fetch_from = Some(next);
            }
            save_manifest(self.store.as_ref(), Self::MANIFEST_PATH, &manifest).await?;
            if done {
                break;
            }
        }

        info!(
            "Form 4 ingest: {} filings over {} pages",
            report.filings_stored, report.pages
        );
        Ok(report)
    }
}
