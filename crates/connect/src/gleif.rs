//! GLEIF golden-copy connector: the daily ISIN-to-LEI relationship file.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use zip::ZipArchive;

use tickerlink_core::mapping::{LeiSource, SourceIndex};
use tickerlink_core::{Record, SourceError};

use crate::client::ApiClient;
use crate::errors::ConnectError;

const DIRECTORY_URL: &str = "https://isinmapping.gleif.org/api/v2/isin-lei";

pub struct GleifConnector {
    client: ApiClient,
}

impl GleifConnector {
    pub fn new() -> Self {
        Self {
            client: ApiClient::new(),
        }
    }

    async fn fetch_relationship_file(&self) -> Result<SourceIndex, ConnectError> {
        // The directory endpoint lists published files newest first.
        let directory: Directory = self.client.get_json(DIRECTORY_URL, &[]).await?;
        let download_url = directory
            .data
            .first()
            .map(|entry| entry.links.download.clone())
            .ok_or_else(|| ConnectError::Malformed("empty golden-copy directory".into()))?;

        let bytes = self.client.get_bytes(&download_url).await?;
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entry = archive.by_index(0)?;
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|err| ConnectError::Malformed(format!("golden-copy archive: {err}")))?;

        parse_isin_lei_table(&text)
    }
}

impl Default for GleifConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeiSource for GleifConnector {
    fn id(&self) -> &'static str {
        "gleif"
    }

    async fn fetch_leis(&self) -> Result<SourceIndex, SourceError> {
        self.fetch_relationship_file().await.map_err(Into::into)
    }
}

/// Parse the `LEI,ISIN` relationship CSV, keeping only US-prefixed ISINs.
fn parse_isin_lei_table(text: &str) -> Result<SourceIndex, ConnectError> {
    let mut index = SourceIndex::safe(["isin"], "isin")?;
    for line in text.lines().skip(1) {
        let Some((lei, isin)) = line.split_once(',') else {
            continue;
        };
        let (lei, isin) = (lei.trim(), isin.trim());
        if lei.is_empty() || !isin.starts_with("US") {
            continue;
        }
        let record = Record::new().with("isin", isin).with("lei", lei);
        if let Err(err) = index.insert(record) {
            debug!("isin-lei row skipped: {err}");
        }
    }
    debug!("gleif: {} US isin-lei pairs", index.len());
    Ok(index)
}

#[derive(Debug, Deserialize)]
struct Directory {
    #[serde(default)]
    data: Vec<DirectoryEntry>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    links: DirectoryLinks,
}

#[derive(Debug, Deserialize)]
struct DirectoryLinks {
    download: String,
}
