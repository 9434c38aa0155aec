//! Identifier resolution port.
//!
//! Filing ingestion needs point lookups (CUSIP to ticker, CIK to ticker)
//! without caring whether the answer comes from a built mapping or a remote
//! service. [`ChainResolver`] composes both: the in-memory mapping answers
//! first, a network-backed resolver fills the misses.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::errors::SourceError;
use crate::mapping::TickerMappingRecord;
use crate::mindex::{IndexError, MultiIndex};

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("resolver backend failed: {0}")]
    Source(#[from] SourceError),
}

/// Point lookups from one identifier to a ticker. `Ok(None)` means the
/// backend answered and genuinely does not know; errors are reserved for
/// backend failures.
#[async_trait]
pub trait TickerResolver: Send + Sync {
    fn id(&self) -> &'static str;

    async fn resolve_cusip(&self, cusip: &str) -> Result<Option<String>, ResolverError>;

    async fn resolve_cik(&self, cik: &str) -> Result<Option<String>, ResolverError>;
}

/// Resolver backed by a built ticker mapping.
pub struct MappingResolver {
    mapping: MultiIndex<TickerMappingRecord>,
}

impl MappingResolver {
    pub fn new(mapping: MultiIndex<TickerMappingRecord>) -> Self {
        Self { mapping }
    }
}

#[async_trait]
impl TickerResolver for MappingResolver {
    fn id(&self) -> &'static str {
        "mapping"
    }

    async fn resolve_cusip(&self, cusip: &str) -> Result<Option<String>, ResolverError> {
        let record = self.mapping.get("cusip", Some(cusip))?;
        Ok(record.map(|r| r.ticker.clone()))
    }

    async fn resolve_cik(&self, cik: &str) -> Result<Option<String>, ResolverError> {
        let record = self.mapping.get("cik", Some(cik))?;
        Ok(record.map(|r| r.ticker.clone()))
    }
}

/// Ordered resolver chain: the first backend returning `Some` wins. A
/// backend failure falls through to the next backend; the error surfaces
/// only when every backend fails.
pub struct ChainResolver {
    resolvers: Vec<Arc<dyn TickerResolver>>,
}

impl ChainResolver {
    pub fn new(resolvers: Vec<Arc<dyn TickerResolver>>) -> Self {
        Self { resolvers }
    }
}

#[async_trait]
impl TickerResolver for ChainResolver {
    fn id(&self) -> &'static str {
        "chain"
    }

    async fn resolve_cusip(&self, cusip: &str) -> Result<Option<String>, ResolverError> {
        let mut last_err = None;
        for resolver in &self.resolvers {
            match resolver.resolve_cusip(cusip).await {
                Ok(Some(ticker)) => return Ok(Some(ticker)),
                Ok(None) => continue,
                Err(err) => {
                    debug!("resolver '{}' failed for cusip '{cusip}': {err}", resolver.id());
                    last_err = Some(err);
                }
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    async fn resolve_cik(&self, cik: &str) -> Result<Option<String>, ResolverError> {
        let mut last_err = None;
        for resolver in &self.resolvers {
            match resolver.resolve_cik(cik).await {
                Ok(Some(ticker)) => return Ok(Some(ticker)),
                Ok(None) => continue,
                Err(err) => {
                    debug!("resolver '{}' failed for cik '{cik}': {err}", resolver.id());
                    last_err = Some(err);
                }
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::mapping_index;

    fn apple_mapping() -> MultiIndex<TickerMappingRecord> {
        let mut mapping = mapping_index().unwrap();
        let mut record = TickerMappingRecord::new("AAPL", "Apple Inc.");
        record.cusip = Some("037833100".into());
        record.cik = Some("320193".into());
        mapping.insert(record).unwrap();
        mapping
    }

    struct FixedResolver {
        answer: Option<String>,
        fail: bool,
    }

    #[async_trait]
    impl TickerResolver for FixedResolver {
        fn id(&self) -> &'static str {
            "fixed"
        }

        async fn resolve_cusip(&self, _cusip: &str) -> Result<Option<String>, ResolverError> {
            if self.fail {
                return Err(ResolverError::Source(SourceError::RateLimited));
            }
            Ok(self.answer.clone())
        }

        async fn resolve_cik(&self, _cik: &str) -> Result<Option<String>, ResolverError> {
            if self.fail {
                return Err(ResolverError::Source(SourceError::RateLimited));
            }
            Ok(self.answer.clone())
        }
    }

    #[tokio::test]
    async fn test_mapping_resolver_answers_from_the_index() {
        let resolver = MappingResolver::new(apple_mapping());
        assert_eq!(
            resolver.resolve_cusip("037833100").await.unwrap().as_deref(),
            Some("AAPL")
        );
        assert_eq!(
            resolver.resolve_cik("320193").await.unwrap().as_deref(),
            Some("AAPL")
        );
        assert!(resolver.resolve_cusip("000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chain_prefers_earlier_backends() {
        let chain = ChainResolver::new(vec![
            Arc::new(MappingResolver::new(apple_mapping())),
            Arc::new(FixedResolver {
                answer: Some("WRONG".into()),
                fail: false,
            }),
        ]);
        assert_eq!(
            chain.resolve_cusip("037833100").await.unwrap().as_deref(),
            Some("AAPL")
        );
    }

    #[tokio::test]
    async fn test_chain_falls_through_misses_and_failures() {
        let chain = ChainResolver::new(vec![
            Arc::new(FixedResolver {
                answer: None,
                fail: false,
            }),
            Arc::new(FixedResolver {
                answer: None,
                fail: true,
            }),
            Arc::new(FixedResolver {
                answer: Some("MSFT".into()),
                fail: false,
            }),
        ]);
        assert_eq!(
            chain.resolve_cusip("594918104").await.unwrap().as_deref(),
            Some("MSFT")
        );
    }

    #[tokio::test]
    async fn test_chain_surfaces_error_only_when_all_backends_fail() {
        let chain = ChainResolver::new(vec![
            Arc::new(FixedResolver {
                answer: None,
                fail: false,
            }),
            Arc::new(FixedResolver {
                answer: None,
                fail: true,
            }),
        ]);
        assert!(chain.resolve_cusip("594918104").await.is_err());

        let empty = ChainResolver::new(Vec::new());
        assert!(empty.resolve_cusip("594918104").await.unwrap().is_none());
    }
}
