use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapping::model::{TickerMappingRecord, MAPPING_INDEX_KEYS};
use crate::mindex::{IndexedRecord, MultiIndex};

/// Per-identifier fill counts over a built mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierCoverage {
    pub total: usize,
    /// `(identifier, records defining it)` in canonical key order.
    pub counts: Vec<(String, usize)>,
}

impl IdentifierCoverage {
    pub fn from_index(mapping: &MultiIndex<TickerMappingRecord>) -> Self {
        let total = mapping.len();
        let counts = MAPPING_INDEX_KEYS
            .iter()
            .map(|key| {
                let n = mapping.iter().filter(|r| r.index_value(key).is_some()).count();
                (key.to_string(), n)
            })
            .collect();
        Self { total, counts }
    }
}

impl fmt::Display for IdentifierCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} records", self.total)?;
        for (key, n) in &self.counts {
            let pct = if self.total == 0 {
                0.0
            } else {
                *n as f64 * 100.0 / self.total as f64
            };
            writeln!(f, "  {key:<14} {n:>8} ({pct:.1}%)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::model::mapping_index;

    #[test]
    fn test_coverage_counts_defined_identifiers() {
        let mut mapping = mapping_index().unwrap();
        let mut apple = TickerMappingRecord::new("AAPL", "Apple Inc.");
        apple.cusip = Some("037833100".into());
        apple.cik = Some("320193".into());
        mapping.insert(apple).unwrap();
        mapping
            .insert(TickerMappingRecord::new("MSFT", "Microsoft"))
            .unwrap();

        let coverage = IdentifierCoverage::from_index(&mapping);
        assert_eq!(coverage.total, 2);
        let get = |key: &str| {
            coverage
                .counts
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, n)| *n)
                .unwrap()
        };
        assert_eq!(get("ticker"), 2);
        assert_eq!(get("cusip"), 1);
        assert_eq!(get("isin"), 0);
    }
}
