use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use async_trait::async_trait;
use table_cache::{MemoryRecordStore, Record, RecordStore, StoreError, StoreResult};

/// Record store double that counts calls and can be told to fail
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryRecordStore,
    scans: AtomicUsize,
    queries: AtomicUsize,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(table: &str, records: Vec<Record>) -> Self {
        let store = Self::default();
        store.inner.create_table(table);
        for record in records {
            store.inner.insert(table, record);
        }
        store
    }

    pub fn inner(&self) -> &MemoryRecordStore {
        &self.inner
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Total number of store calls
    pub fn calls(&self) -> usize {
        self.scans() + self.queries()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn scan(&self, table: &str) -> StoreResult<Vec<Record>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.inner.scan(table).await
    }

    async fn query(&self, table: &str, index_name: &str, key: &str) -> StoreResult<Option<Record>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.inner.query(table, index_name, key).await
    }
}
