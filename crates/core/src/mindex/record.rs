use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record that can live in a [`MultiIndex`](super::MultiIndex).
///
/// `index_value` returns the record's value for a designated key field, or
/// `None` when the record does not define that field. Empty strings count as
/// undefined: provider payloads routinely carry `""` where an identifier is
/// simply unknown, and an empty string must never become an index entry.
pub trait IndexedRecord {
    fn index_value(&self, key: &str) -> Option<&str>;
}

/// Schema-less record: an ordered map of field name to JSON value.
///
/// Used for raw provider payloads before normalization, where the field set
/// varies per source and per row. Fixed-shape data should use a dedicated
/// struct implementing [`IndexedRecord`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field accessor; empty strings read as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl IndexedRecord for Record {
    fn index_value(&self, key: &str) -> Option<&str> {
        self.get_str(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_reads_as_absent() {
        let record = Record::new().with("ticker", "AAPL").with("cusip", "");
        assert_eq!(record.index_value("ticker"), Some("AAPL"));
        assert_eq!(record.index_value("cusip"), None);
        assert!(record.contains_key("cusip"));
    }

    #[test]
    fn test_non_string_values_do_not_index() {
        let record = Record::new().with("ticker", "AAPL").with("employees", 161_000);
        assert_eq!(record.index_value("employees"), None);
        assert_eq!(record.get("employees").and_then(Value::as_u64), Some(161_000));
    }

    #[test]
    fn test_serde_round_trip() {
        let record = Record::new().with("ticker", "MSFT").with("cik", "789019");
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
