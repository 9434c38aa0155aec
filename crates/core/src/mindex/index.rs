use std::collections::HashMap;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use super::errors::IndexError;
use super::record::IndexedRecord;

/// In-memory record collection addressable by several unique key fields at
/// once.
///
/// Every index key is globally unique across the live records that define
/// it: a financial entity carries several independently assigned identifiers
/// (ticker, CIK, CUSIP, ISIN, ...), each unique on its own, arriving from
/// different sources with different completeness. Inserts are atomic - a
/// collision or completeness failure leaves the collection untouched.
///
/// In strict mode every inserted record must define every index key. In safe
/// mode only the default key is mandatory, which is what progressive
/// enrichment needs: a ticker may have no CUSIP yet.
///
/// Single-writer by design. There is no interior locking; callers needing
/// concurrent access must serialize externally.
#[derive(Debug, Clone)]
pub struct MultiIndex<R> {
    index_keys: Vec<String>,
    default_index_key: Option<String>,
    safe_mode: bool,
    /// Insertion-ordered slots; `None` marks a removed record.
    slots: Vec<Option<R>>,
    /// Per index key: value -> slot of the owning record.
    lookups: HashMap<String, HashMap<String, usize>>,
    len: usize,
}

impl<R> MultiIndex<R> {
    /// Strict-mode index: every record must define every key.
    pub fn new<I, S>(index_keys: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(index_keys, None, false)
    }

    /// Safe-mode index: only `default_index_key` is mandatory per record.
    pub fn safe<I, S>(index_keys: I, default_index_key: &str) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(index_keys, Some(default_index_key), true)
    }

    pub fn with_config<I, S>(
        index_keys: I,
        default_index_key: Option<&str>,
        safe_mode: bool,
    ) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index_keys: Vec<String> = index_keys.into_iter().map(Into::into).collect();
        if index_keys.is_empty() {
            return Err(IndexError::Config("index key list is empty".into()));
        }
        let mut seen = HashMap::with_capacity(index_keys.len());
        for key in &index_keys {
            if seen.insert(key.as_str(), ()).is_some() {
                return Err(IndexError::Config(format!("duplicate index key '{key}'")));
            }
        }
        if let Some(default) = default_index_key {
            if !index_keys.iter().any(|k| k == default) {
                return Err(IndexError::Config(format!(
                    "default index key '{default}' is not an index key"
                )));
            }
        }
        if safe_mode && default_index_key.is_none() {
            return Err(IndexError::Config(
                "safe mode requires a default index key".into(),
            ));
        }

        let lookups = index_keys
            .iter()
            .map(|k| (k.clone(), HashMap::new()))
            .collect();
        Ok(Self {
            index_keys,
            default_index_key: default_index_key.map(str::to_string),
            safe_mode,
            slots: Vec::new(),
            lookups,
            len: 0,
        })
    }

    pub fn index_keys(&self) -> &[String] {
        &self.index_keys
    }

    pub fn default_index_key(&self) -> Option<&str> {
        self.default_index_key.as_deref()
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

impl<R: IndexedRecord> MultiIndex<R> {
    /// Insert a record, registering it under every index key it defines.
    ///
    /// Checking order: first collisions across all keys the record defines,
    /// then completeness. No mutation happens before both checks pass.
    pub fn insert(&mut self, record: R) -> Result<(), IndexError> {
        for key in &self.index_keys {
            if let Some(value) = record.index_value(key) {
                if let Some(table) = self.lookups.get(key) {
                    if table.contains_key(value) {
                        return Err(IndexError::Collision {
                            key: key.clone(),
                            value: value.to_string(),
                        });
                    }
                }
            }
        }

        if self.safe_mode {
            // Construction guarantees a default key exists in safe mode.
            if let Some(default) = self.default_index_key.as_deref() {
                if record.index_value(default).is_none() {
                    return Err(IndexError::IncompleteRecord {
                        key: default.to_string(),
                    });
                }
            }
        } else {
            for key in &self.index_keys {
                if record.index_value(key).is_none() {
                    return Err(IndexError::IncompleteRecord { key: key.clone() });
                }
            }
        }

        let entries: Vec<(String, String)> = self
            .index_keys
            .iter()
            .filter_map(|k| record.index_value(k).map(|v| (k.clone(), v.to_string())))
            .collect();
        let slot = self.slots.len();
        self.slots.push(Some(record));
        for (key, value) in entries {
            if let Some(table) = self.lookups.get_mut(&key) {
                table.insert(value, slot);
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Look up the record whose `key` field equals `value`.
    ///
    /// A `None` value short-circuits to `Ok(None)` so dependent lookups can
    /// be chained without null checks at every link. A miss is `Ok(None)` in
    /// safe mode and `Err(NotFound)` in strict mode.
    pub fn get(&self, key: &str, value: Option<&str>) -> Result<Option<&R>, IndexError> {
        let table = self
            .lookups
            .get(key)
            .ok_or_else(|| IndexError::InvalidKey(key.to_string()))?;
        let Some(value) = value else {
            return Ok(None);
        };
        match table.get(value) {
            Some(&slot) => Ok(self.slots.get(slot).and_then(Option::as_ref)),
            None if self.safe_mode => Ok(None),
            None => Err(IndexError::NotFound {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Remove and return the record whose `key` field equals `value`.
    ///
    /// Unlike [`get`](Self::get), a miss is always `Err(NotFound)`, safe
    /// mode or not - removing a nonexistent entry is a caller error.
    pub fn remove(&mut self, key: &str, value: &str) -> Result<R, IndexError> {
        let table = self
            .lookups
            .get(key)
            .ok_or_else(|| IndexError::InvalidKey(key.to_string()))?;
        let not_found = || IndexError::NotFound {
            key: key.to_string(),
            value: value.to_string(),
        };
        let slot = *table.get(value).ok_or_else(not_found)?;
        let record = self
            .slots
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or_else(not_found)?;
        for k in &self.index_keys {
            if let Some(v) = record.index_value(k) {
                if let Some(t) = self.lookups.get_mut(k) {
                    t.remove(v);
                }
            }
        }
        self.len -= 1;
        Ok(record)
    }

    /// Every value of `key` across live records that define it, in
    /// insertion order.
    pub fn key_values(&self, key: &str) -> Result<Vec<&str>, IndexError> {
        if !self.lookups.contains_key(key) {
            return Err(IndexError::InvalidKey(key.to_string()));
        }
        Ok(self.iter().filter_map(|r| r.index_value(key)).collect())
    }
}

impl<'a, R> IntoIterator for &'a MultiIndex<R> {
    type Item = &'a R;
    type IntoIter = std::iter::FilterMap<std::slice::Iter<'a, Option<R>>, fn(&Option<R>) -> Option<&R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

impl<R> IntoIterator for MultiIndex<R> {
    type Item = R;
    type IntoIter = std::iter::Flatten<std::vec::IntoIter<Option<R>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter().flatten()
    }
}

#[derive(serde::Serialize)]
struct SnapshotRef<'a, R> {
    index_keys: &'a [String],
    default_index_key: Option<&'a str>,
    safe_mode: bool,
    records: Vec<&'a R>,
}

#[derive(serde::Deserialize)]
struct Snapshot<R> {
    index_keys: Vec<String>,
    default_index_key: Option<String>,
    safe_mode: bool,
    records: Vec<R>,
}

impl<R: Serialize> Serialize for MultiIndex<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SnapshotRef {
            index_keys: &self.index_keys,
            default_index_key: self.default_index_key.as_deref(),
            safe_mode: self.safe_mode,
            records: self.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, R: IndexedRecord + Deserialize<'de>> Deserialize<'de> for MultiIndex<R> {
    /// Rebuilds the lookup tables through `insert`, so a snapshot that
    /// violates the index invariants fails to load instead of producing a
    /// corrupt collection.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = Snapshot::<R>::deserialize(deserializer)?;
        let mut index = MultiIndex::with_config(
            snapshot.index_keys,
            snapshot.default_index_key.as_deref(),
            snapshot.safe_mode,
        )
        .map_err(serde::de::Error::custom)?;
        for record in snapshot.records {
            index.insert(record).map_err(serde::de::Error::custom)?;
        }
        Ok(index)
    }
}
