use std::sync::Arc;

use log::{debug, info};

use crate::identifiers::normalize_ticker;
use crate::mapping::builder::{build_ticker_mapping, MappingSources};
use crate::mapping::coverage::IdentifierCoverage;
use crate::mapping::errors::MappingError;
use crate::mapping::model::TickerMappingRecord;
use crate::mapping::traits::{AggregatorSource, LeiSource, RegistrySource, TickerUniverseSource};
use crate::mindex::MultiIndex;

/// Orchestrates a full mapping build: fetches every source, then hands the
/// indexes to the builder.
///
/// Fetching is fail-fast. Any source failure aborts the build with the
/// failing source named; a partially sourced mapping is worse than none
/// because downstream consumers cannot tell a missing identifier from an
/// unfetched one.
pub struct MappingService {
    universe: Arc<dyn TickerUniverseSource>,
    registry: Arc<dyn RegistrySource>,
    aggregator: Arc<dyn AggregatorSource>,
    lei: Arc<dyn LeiSource>,
}

impl MappingService {
    pub fn new(
        universe: Arc<dyn TickerUniverseSource>,
        registry: Arc<dyn RegistrySource>,
        aggregator: Arc<dyn AggregatorSource>,
        lei: Arc<dyn LeiSource>,
    ) -> Self {
        Self {
            universe,
            registry,
            aggregator,
            lei,
        }
    }

    /// Fetch every source index, in dependency order.
    pub async fn fetch_sources(&self) -> Result<MappingSources, MappingError> {
        let fail = |source: &'static str| {
            move |cause| MappingError::SourceUnavailable { source, cause }
        };

        let tickers = self
            .universe
            .fetch_tickers()
            .await
            .map_err(fail(self.universe.id()))?;
        debug!("fetched {} universe tickers", tickers.len());

        let wanted: Vec<String> = tickers
            .iter()
            .filter_map(|r| r.get_str("ticker").and_then(normalize_ticker))
            .collect();
        let ticker_details = self
            .universe
            .fetch_ticker_details(&wanted)
            .await
            .map_err(fail(self.universe.id()))?;
        let exchanges = self
            .universe
            .fetch_exchanges()
            .await
            .map_err(fail(self.universe.id()))?;

        let registry_ciks = self
            .registry
            .fetch_ciks()
            .await
            .map_err(fail(self.registry.id()))?;
        let registry_cusips = self
            .registry
            .fetch_cusips()
            .await
            .map_err(fail(self.registry.id()))?;

        let aggregator_tickers = self
            .aggregator
            .fetch_tickers()
            .await
            .map_err(fail(self.aggregator.id()))?;
        let aggregator_leis = self
            .aggregator
            .fetch_leis()
            .await
            .map_err(fail(self.aggregator.id()))?;
        let aggregator_industries = self
            .aggregator
            .fetch_industries()
            .await
            .map_err(fail(self.aggregator.id()))?;

        let lei_registry = self
            .lei
            .fetch_leis()
            .await
            .map_err(fail(self.lei.id()))?;

        Ok(MappingSources {
            tickers,
            ticker_details,
            exchanges,
            registry_ciks,
            registry_cusips,
            aggregator_tickers,
            aggregator_leis,
            aggregator_industries,
            lei_registry,
        })
    }

    /// Fetch all sources and build the unified mapping.
    pub async fn build(&self) -> Result<MultiIndex<TickerMappingRecord>, MappingError> {
        let sources = self.fetch_sources().await?;
        let mapping = build_ticker_mapping(&sources)?;
        let coverage = IdentifierCoverage::from_index(&mapping);
        info!("mapping build complete:\n{coverage}");
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::mapping::traits::SourceIndex;
    use crate::mindex::Record;
    use async_trait::async_trait;

    fn safe(keys: &[&str], default: &str) -> SourceIndex {
        SourceIndex::safe(keys.iter().copied(), default).unwrap()
    }

    struct FakeUniverse;

    #[async_trait]
    impl TickerUniverseSource for FakeUniverse {
        fn id(&self) -> &'static str {
            "fake-universe"
        }

        async fn fetch_tickers(&self) -> Result<SourceIndex, SourceError> {
            let mut index = safe(&["ticker"], "ticker");
            index
                .insert(
                    Record::new()
                        .with("ticker", "AAPL")
                        .with("name", "Apple Inc.")
                        .with("locale", "us"),
                )
                .map_err(SourceError::from)?;
            Ok(index)
        }

        async fn fetch_ticker_details(
            &self,
            tickers: &[String],
        ) -> Result<SourceIndex, SourceError> {
            assert_eq!(tickers, ["AAPL".to_string()]);
            let mut index = safe(&["ticker"], "ticker");
            index
                .insert(Record::new().with("ticker", "AAPL").with("cusip", "037833100"))
                .map_err(SourceError::from)?;
            Ok(index)
        }

        async fn fetch_exchanges(&self) -> Result<SourceIndex, SourceError> {
            Ok(safe(&["mic"], "mic"))
        }
    }

    struct FakeRegistry {
        fail: bool,
    }

    #[async_trait]
    impl RegistrySource for FakeRegistry {
        fn id(&self) -> &'static str {
            "fake-registry"
        }

        async fn fetch_ciks(&self) -> Result<SourceIndex, SourceError> {
            if self.fail {
                return Err(SourceError::Network("connection refused".into()));
            }
            let mut index = safe(&["ticker"], "ticker");
            index
                .insert(Record::new().with("ticker", "AAPL").with("cik", "0000320193"))
                .map_err(SourceError::from)?;
            Ok(index)
        }

        async fn fetch_cusips(&self) -> Result<SourceIndex, SourceError> {
            Ok(safe(&["ticker"], "ticker"))
        }
    }

    struct FakeAggregator;

    #[async_trait]
    impl AggregatorSource for FakeAggregator {
        fn id(&self) -> &'static str {
            "fake-aggregator"
        }

        async fn fetch_tickers(&self) -> Result<SourceIndex, SourceError> {
            Ok(safe(&["ticker"], "ticker"))
        }

        async fn fetch_leis(&self) -> Result<SourceIndex, SourceError> {
            Ok(safe(&["cik"], "cik"))
        }

        async fn fetch_industries(&self) -> Result<SourceIndex, SourceError> {
            Ok(safe(&["sic"], "sic"))
        }
    }

    struct FakeLei;

    #[async_trait]
    impl LeiSource for FakeLei {
        fn id(&self) -> &'static str {
            "fake-lei"
        }

        async fn fetch_leis(&self) -> Result<SourceIndex, SourceError> {
            Ok(safe(&["isin"], "isin"))
        }
    }

    fn service(registry_fails: bool) -> MappingService {
        MappingService::new(
            Arc::new(FakeUniverse),
            Arc::new(FakeRegistry {
                fail: registry_fails,
            }),
            Arc::new(FakeAggregator),
            Arc::new(FakeLei),
        )
    }

    #[tokio::test]
    async fn test_build_joins_all_sources() {
        let mapping = service(false).build().await.unwrap();
        assert_eq!(mapping.len(), 1);
        let record = mapping.get("ticker", Some("AAPL")).unwrap().unwrap();
        assert_eq!(record.cik.as_deref(), Some("320193"));
        assert_eq!(record.isin.as_deref(), Some("US0378331005"));
    }

    #[tokio::test]
    async fn test_build_fails_fast_naming_the_source() {
        let err = service(true).build().await.unwrap_err();
        match err {
            MappingError::SourceUnavailable { source, .. } => {
                assert_eq!(source, "fake-registry");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
