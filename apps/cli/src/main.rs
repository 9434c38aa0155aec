mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use config::Config;
use tickerlink_connect::{
    GleifConnector, PolygonConnector, PolygonTickerResolver, RankAndFiledConnector,
    SecGovConnector, SecSearchConnector,
};
use tickerlink_core::filings::{Form4Ingestor, ThirteenFIngestor};
use tickerlink_core::mapping::{IdentifierCoverage, MappingService, TickerMappingRecord};
use tickerlink_core::resolver::{ChainResolver, MappingResolver, TickerResolver};
use tickerlink_core::storage::{LocalBlobStore, MemoryStore};
use tickerlink_core::MultiIndex;

#[derive(Parser)]
#[command(name = "tickerlink", about = "Ticker mapping and SEC filing pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every source and build the unified ticker mapping.
    BuildMapping {
        /// Snapshot output path.
        #[arg(long, default_value = "mapping.json")]
        out: PathBuf,
    },
    /// Print identifier coverage for a mapping snapshot.
    Stats {
        #[arg(long, default_value = "mapping.json")]
        mapping: PathBuf,
    },
    /// Ingest 13F holdings reports into the data directory.
    Ingest13f {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        /// Mapping snapshot used to resolve CUSIPs locally first.
        #[arg(long)]
        mapping: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        max_pages: usize,
    },
    /// Ingest Form 4 insider filings into the data directory.
    IngestForm4 {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long)]
        mapping: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        max_pages: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    match Cli::parse().command {
        Command::BuildMapping { out } => build_mapping(&config, &out).await,
        Command::Stats { mapping } => stats(&mapping).await,
        Command::Ingest13f {
            data_dir,
            mapping,
            max_pages,
        } => ingest_13f(&config, &data_dir, mapping.as_deref(), max_pages).await,
        Command::IngestForm4 {
            data_dir,
            mapping,
            max_pages,
        } => ingest_form4(&config, &data_dir, mapping.as_deref(), max_pages).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

async fn build_mapping(config: &Config, out: &std::path::Path) -> Result<()> {
    let polygon = Arc::new(
        PolygonConnector::new(config.polygon_api_key()?).with_cache(Arc::new(MemoryStore::new())),
    );
    let service = MappingService::new(
        polygon,
        Arc::new(SecGovConnector::new()),
        Arc::new(RankAndFiledConnector::new()),
        Arc::new(GleifConnector::new()),
    );

    let mapping = service.build().await?;
    let json = serde_json::to_vec_pretty(&mapping)?;
    tokio::fs::write(out, json)
        .await
        .with_context(|| format!("writing {}", out.display()))?;

    println!("{}", IdentifierCoverage::from_index(&mapping));
    println!("snapshot written to {}", out.display());
    Ok(())
}

async fn stats(path: &std::path::Path) -> Result<()> {
    let mapping = load_mapping(path).await?;
    println!("{}", IdentifierCoverage::from_index(&mapping));
    Ok(())
}

async fn ingest_13f(
    config: &Config,
    data_dir: &std::path::Path,
    mapping: Option<&std::path::Path>,
    max_pages: usize,
) -> Result<()> {
    let source = Arc::new(SecSearchConnector::new(config.sec_api_token()?));
    let store = Arc::new(LocalBlobStore::new(data_dir));
    let resolver = build_resolver(config, mapping).await?;

    let report = ThirteenFIngestor::new(source, store, resolver)
        .run(max_pages)
        .await?;
    println!(
        "stored {} filings over {} pages",
        report.filings_stored, report.pages
    );
    Ok(())
}

async fn ingest_form4(
    config: &Config,
    data_dir: &std::path::Path,
    mapping: Option<&std::path::Path>,
    max_pages: usize,
) -> Result<()> {
    let source = Arc::new(SecSearchConnector::new(config.sec_api_token()?));
    let store = Arc::new(LocalBlobStore::new(data_dir));
    let resolver = build_resolver(config, mapping).await?;

    let report = Form4Ingestor::new(source, store, resolver)
        .run(max_pages)
        .await?;
    println!(
        "stored {} filings over {} pages",
        report.filings_stored, report.pages
    );
    Ok(())
}

/// Local mapping snapshot first when one is given, vendor lookups as the
/// fallback.
async fn build_resolver(
    config: &Config,
    mapping: Option<&std::path::Path>,
) -> Result<Arc<dyn TickerResolver>> {
    let mut resolvers: Vec<Arc<dyn TickerResolver>> = Vec::new();
    if let Some(path) = mapping {
        resolvers.push(Arc::new(MappingResolver::new(load_mapping(path).await?)));
    }
    if let Ok(key) = config.polygon_api_key() {
        let polygon =
            Arc::new(PolygonConnector::new(key).with_cache(Arc::new(MemoryStore::new())));
        resolvers.push(Arc::new(PolygonTickerResolver::new(polygon)));
    }
    Ok(Arc::new(ChainResolver::new(resolvers)))
}

async fn load_mapping(path: &std::path::Path) -> Result<MultiIndex<TickerMappingRecord>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}
