use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::warn;

use crate::config::TableDescriptor;
use crate::traits::{index_value, IndexCache, Record};

/// Statistics for cache operations
#[derive(Debug, Default)]
pub struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheStatistics {
    /// Get the number of cache hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get the number of cache misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get the number of expired entries dropped
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Get the number of entries removed or cleared explicitly
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Calculate the cache hit rate (hits / (hits + misses))
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_invalidations(&self, count: usize) {
        self.invalidations.fetch_add(count as u64, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: Record,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn new(record: Record, ttl: Option<Duration>) -> Self {
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        Self { record, expires_at }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    by_primary: HashMap<String, CacheEntry>,
    secondary: HashMap<String, HashMap<String, Vec<String>>>,
}

impl CacheState {
    fn insert(&mut self, secondary_indexes: &[String], primary_key: String, entry: CacheEntry) {
        self.remove_primary(secondary_indexes, &primary_key);

        for index_name in secondary_indexes {
            if let Some(value) = index_value(&entry.record, index_name) {
                self.secondary
                    .entry(index_name.clone())
                    .or_default()
                    .entry(value)
                    .or_default()
                    .push(primary_key.clone());
            }
        }

        self.by_primary.insert(primary_key, entry);
    }

    fn remove_primary(&mut self, secondary_indexes: &[String], primary_key: &str) -> bool {
        let Some(entry) = self.by_primary.remove(primary_key) else {
            return false;
        };

        for index_name in secondary_indexes {
            if let Some(value) = index_value(&entry.record, index_name) {
                if let Some(index) = self.secondary.get_mut(index_name) {
                    if let Some(keys) = index.get_mut(&value) {
                        keys.retain(|key| key != primary_key);
                        if keys.is_empty() {
                            index.remove(&value);
                        }
                    }
                    if index.is_empty() {
                        self.secondary.remove(index_name);
                    }
                }
            }
        }
        true
    }

    fn primary_keys_for(&self, index_name: &str, key: &str) -> Vec<String> {
        self.secondary
            .get(index_name)
            .and_then(|index| index.get(key))
            .cloned()
            .unwrap_or_default()
    }
}

/// An in-memory record cache addressable by any of its configured indexes.
///
/// Entries are owned by their primary index value; every other index maps a
/// value to the primary keys of the entries carrying it. Entries expire after
/// the time-to-live given when they were written and are dropped lazily on
/// lookup or by [`ExpiringIndexCache::evict_expired`].
#[derive(Debug)]
pub struct ExpiringIndexCache {
    primary_index: String,
    secondary_indexes: Vec<String>,
    state: RwLock<CacheState>,
    statistics: CacheStatistics,
}

impl ExpiringIndexCache {
    /// Creates an empty cache keyed by `primary_index` and addressable by
    /// each of `secondary_indexes`.
    pub fn new<I, S>(primary_index: impl Into<String>, secondary_indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            primary_index: primary_index.into(),
            secondary_indexes: secondary_indexes.into_iter().map(Into::into).collect(),
            state: RwLock::new(CacheState::default()),
            statistics: CacheStatistics::default(),
        }
    }

    /// Creates an empty cache for the indexes of a table
    pub fn for_table(descriptor: &TableDescriptor) -> Self {
        Self::new(descriptor.primary_index(), &descriptor.indexes()[1..])
    }

    /// The index entries are keyed by
    pub fn primary_index(&self) -> &str {
        &self.primary_index
    }

    /// Gets the cache statistics
    pub fn statistics(&self) -> &CacheStatistics {
        &self.statistics
    }

    /// Checks if an unexpired entry is stored under the primary key
    pub fn contains(&self, primary_key: &str) -> bool {
        let now = Utc::now();
        self.state
            .read()
            .by_primary
            .get(primary_key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Drops every expired entry and returns how many were dropped
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let mut state = self.state.write();
        let expired: Vec<String> = state
            .by_primary
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove_primary(&self.secondary_indexes, key);
        }
        self.statistics.record_evictions(expired.len());
        expired.len()
    }

    fn get_live(&self, primary_keys: &[String]) -> Option<Record> {
        let now = Utc::now();
        let mut expired = Vec::new();
        let found = {
            let state = self.state.read();
            primary_keys.iter().find_map(|key| {
                let entry = state.by_primary.get(key)?;
                if entry.is_expired(now) {
                    expired.push(key.clone());
                    None
                } else {
                    Some(entry.record.clone())
                }
            })
        };

        if !expired.is_empty() {
            let mut state = self.state.write();
            // Re-checked under the write lock; a writer may have refreshed it.
            let evicted = expired
                .iter()
                .filter(|key| state.by_primary.get(*key).is_some_and(|entry| entry.is_expired(now)))
                .cloned()
                .collect::<Vec<_>>();
            for key in &evicted {
                state.remove_primary(&self.secondary_indexes, key);
            }
            self.statistics.record_evictions(evicted.len());
        }
        found
    }
}

impl IndexCache for ExpiringIndexCache {
    fn get(&self, key: &str, index_name: &str) -> Option<Record> {
        let primary_keys = if index_name == self.primary_index {
            vec![key.to_string()]
        } else {
            self.state.read().primary_keys_for(index_name, key)
        };

        let result = self.get_live(&primary_keys);
        if result.is_some() {
            self.statistics.record_hit();
        } else {
            self.statistics.record_miss();
        }
        result
    }

    fn set(&self, record: Record, ttl: Option<Duration>) {
        let Some(primary_key) = index_value(&record, &self.primary_index) else {
            warn!(
                "Skipping record without a value for primary index '{}'",
                self.primary_index
            );
            return;
        };
        let entry = CacheEntry::new(record, ttl);
        self.state
            .write()
            .insert(&self.secondary_indexes, primary_key, entry);
    }

    fn set_many(&self, records: Vec<Record>, ttl: Option<Duration>) {
        let mut state = self.state.write();
        for record in records {
            match index_value(&record, &self.primary_index) {
                Some(primary_key) => {
                    let entry = CacheEntry::new(record, ttl);
                    state.insert(&self.secondary_indexes, primary_key, entry);
                }
                None => warn!(
                    "Skipping record without a value for primary index '{}'",
                    self.primary_index
                ),
            }
        }
    }

    fn remove(&self, key: &str, index_name: &str) {
        let mut state = self.state.write();
        let primary_keys = if index_name == self.primary_index {
            vec![key.to_string()]
        } else {
            state.primary_keys_for(index_name, key)
        };

        let removed = primary_keys
            .iter()
            .filter(|primary_key| state.remove_primary(&self.secondary_indexes, primary_key))
            .count();
        self.statistics.record_invalidations(removed);
    }

    fn clear(&self) {
        let mut state = self.state.write();
        self.statistics.record_invalidations(state.by_primary.len());
        state.by_primary.clear();
        state.secondary.clear();
    }

    fn count(&self) -> usize {
        self.state.read().by_primary.len()
    }
}
