use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreResult;

/// An opaque keyed mapping of field names to values.
pub type Record = Map<String, Value>;

/// Returns the value of `field` in `record` as an index key.
///
/// Strings are used verbatim, numbers and booleans are rendered as text.
/// Null, array and object values cannot be indexed.
pub fn index_value(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A backing keyed table store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every record of `table`.
    async fn scan(&self, table: &str) -> StoreResult<Vec<Record>>;

    /// Returns the first record of `table` whose `index_name` field equals `key`.
    async fn query(&self, table: &str, index_name: &str, key: &str) -> StoreResult<Option<Record>>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn scan(&self, table: &str) -> StoreResult<Vec<Record>> {
        (**self).scan(table).await
    }

    async fn query(&self, table: &str, index_name: &str, key: &str) -> StoreResult<Option<Record>> {
        (**self).query(table, index_name, key).await
    }
}

/// An in-memory map from index keys to records with expiring entries.
pub trait IndexCache: Send + Sync {
    /// Returns the live record stored under `key` in `index_name`.
    fn get(&self, key: &str, index_name: &str) -> Option<Record>;

    /// Stores a record. `None` or a zero `ttl` means the entry never expires.
    fn set(&self, record: Record, ttl: Option<Duration>);

    /// Stores each record as an independent entry.
    fn set_many(&self, records: Vec<Record>, ttl: Option<Duration>) {
        for record in records {
            self.set(record, ttl);
        }
    }

    /// Removes the entries stored under `key` in `index_name`.
    fn remove(&self, key: &str, index_name: &str);

    /// Removes every entry.
    fn clear(&self);

    /// Returns the number of stored entries, expired ones included.
    fn count(&self) -> usize;
}

impl<C: IndexCache + ?Sized> IndexCache for Arc<C> {
    fn get(&self, key: &str, index_name: &str) -> Option<Record> {
        (**self).get(key, index_name)
    }

    fn set(&self, record: Record, ttl: Option<Duration>) {
        (**self).set(record, ttl)
    }

    fn set_many(&self, records: Vec<Record>, ttl: Option<Duration>) {
        (**self).set_many(records, ttl)
    }

    fn remove(&self, key: &str, index_name: &str) {
        (**self).remove(key, index_name)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn count(&self) -> usize {
        (**self).count()
    }
}
