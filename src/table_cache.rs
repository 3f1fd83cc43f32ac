use tracing::{debug, info, warn};

use crate::cache::ExpiringIndexCache;
use crate::config::{MissPolicy, TableDescriptor, TableOptions};
use crate::error::CacheResult;
use crate::traits::{IndexCache, Record, RecordStore};

/// A read-through cache in front of a single table of a record store.
///
/// Lookups are served from the index cache. What happens on a miss is decided
/// by the table's [`MissPolicy`]. Nothing is ever written to the store.
pub struct TableCache<S, C = ExpiringIndexCache>
where
    S: RecordStore,
    C: IndexCache,
{
    descriptor: TableDescriptor,
    store: S,
    cache: C,
}

impl<S: RecordStore> TableCache<S> {
    /// Creates a table cache backed by `store` with an [`ExpiringIndexCache`]
    /// over the configured indexes. Performs no I/O.
    pub fn new(table: impl Into<String>, options: TableOptions, store: S) -> CacheResult<Self> {
        let descriptor = TableDescriptor::new(table, options)?;
        let cache = ExpiringIndexCache::for_table(&descriptor);
        Ok(Self { descriptor, store, cache })
    }
}

impl<S, C> TableCache<S, C>
where
    S: RecordStore,
    C: IndexCache,
{
    /// Creates a table cache over the given store and cache
    pub fn with_cache(
        table: impl Into<String>,
        options: TableOptions,
        store: S,
        cache: C,
    ) -> CacheResult<Self> {
        let descriptor = TableDescriptor::new(table, options)?;
        Ok(Self { descriptor, store, cache })
    }

    /// The validated table configuration
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    /// The backing record store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The index cache serving lookups
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Loads every record of the table into the cache.
    ///
    /// Each record becomes its own entry, written with the default expiry.
    /// Returns the number of records read from the store.
    pub async fn fill(&self) -> CacheResult<usize> {
        let table = self.descriptor.table();
        let records = self.store.scan(table).await?;
        let count = records.len();
        self.cache.set_many(records, self.descriptor.expire());
        info!("{} table fetched successfully ({} records)", table, count);
        Ok(count)
    }

    /// Looks up a record by `key` in `index_name`, or in the primary index
    /// when no index is given.
    ///
    /// Returns `Ok(None)` when the record cannot be found. An index that is
    /// not configured for the table can never be cached, so such lookups
    /// return `Ok(None)` without touching the cache or the store.
    pub async fn get(&self, key: &str, index_name: Option<&str>) -> CacheResult<Option<Record>> {
        let index_name = index_name.unwrap_or_else(|| self.descriptor.primary_index());
        if !self.descriptor.has_index(index_name) {
            warn!(
                "Index '{}' is not configured for table '{}'",
                index_name,
                self.descriptor.table()
            );
            return Ok(None);
        }

        if self.descriptor.fill_if_empty() && self.cache.count() == 0 {
            debug!("Cache for table '{}' is empty, filling", self.descriptor.table());
            self.fill().await?;
        }

        if let Some(record) = self.cache.get(key, index_name) {
            debug!("Get '{}' by '{}' from cache", key, index_name);
            return Ok(Some(record));
        }

        match self.descriptor.miss_policy() {
            MissPolicy::NoAction => {
                debug!("Cache miss for '{}' by '{}'", key, index_name);
                Ok(None)
            }
            MissPolicy::FullRefill => {
                debug!("Cache miss for '{}' by '{}', refilling", key, index_name);
                self.fill().await?;
                Ok(self.cache.get(key, index_name))
            }
            MissPolicy::TargetedFetch => self.fetch(key, index_name).await,
        }
    }

    /// Removes a cached record. The store is not touched.
    pub fn remove(&self, key: &str, index_name: Option<&str>) {
        let index_name = index_name.unwrap_or_else(|| self.descriptor.primary_index());
        self.cache.remove(key, index_name);
        debug!("Removed '{}' by '{}' from cache", key, index_name);
    }

    /// Removes every cached record. The store is not touched.
    pub fn clear(&self) {
        self.cache.clear();
        debug!("Cleared cache for table '{}'", self.descriptor.table());
    }

    async fn fetch(&self, key: &str, index_name: &str) -> CacheResult<Option<Record>> {
        let record = self
            .store
            .query(self.descriptor.table(), index_name, key)
            .await?;
        debug!("Get '{}' by '{}' from store", key, index_name);

        if let Some(record) = &record {
            self.cache.set(record.clone(), self.descriptor.expire());
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::MemoryRecordStore;
    use serde_json::json;

    #[test]
    fn test_construction_is_validated() {
        let result = TableCache::new("", TableOptions::new(["a"]), MemoryRecordStore::new());
        assert!(matches!(result, Err(CacheError::Configuration(_))));

        let result = TableCache::new("t", TableOptions::new(Vec::<String>::new()), MemoryRecordStore::new());
        assert!(matches!(result, Err(CacheError::Configuration(_))));

        let cache = TableCache::new("t", TableOptions::new(["a", "b"]), MemoryRecordStore::new()).unwrap();
        assert_eq!(cache.descriptor().primary_index(), "a");
        assert_eq!(cache.cache().primary_index(), "a");
    }

    #[tokio::test]
    async fn test_get_defaults_to_primary_index() {
        let store = MemoryRecordStore::new();
        store.insert("users", json!({ "userName": "x", "email": "y" }).as_object().cloned().unwrap());

        let cache = TableCache::new("users", TableOptions::new(["userName", "email"]), store).unwrap();
        assert_eq!(cache.fill().await.unwrap(), 1);

        assert!(cache.get("x", None).await.unwrap().is_some());
        assert!(cache.get("y", Some("email")).await.unwrap().is_some());
        assert!(cache.get("y", None).await.unwrap().is_none());
    }
}
