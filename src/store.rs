use std::collections::HashMap;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{index_value, Record, RecordStore};

/// An in-process table store.
///
/// Tables are created on first insert and keep rows in insertion order.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table, keeping an existing one untouched
    pub fn create_table(&self, table: &str) {
        self.tables.write().entry(table.to_string()).or_default();
    }

    /// Appends a row to a table
    pub fn insert(&self, table: &str, record: Record) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(record);
    }

    /// Deletes every row of `table` whose `index_name` field equals `key`.
    /// Returns the number of deleted rows.
    pub fn delete(&self, table: &str, index_name: &str, key: &str) -> usize {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|row| index_value(row, index_name).as_deref() != Some(key));
        before - rows.len()
    }

    /// Returns the number of rows in a table
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn scan(&self, table: &str) -> StoreResult<Vec<Record>> {
        self.tables
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn query(&self, table: &str, index_name: &str, key: &str) -> StoreResult<Option<Record>> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(rows
            .iter()
            .find(|row| index_value(row, index_name).as_deref() == Some(key))
            .cloned())
    }
}
