//! PostgreSQL-backed record store
//!
//! Every table holds one JSONB document per row:
//!
//! ```sql
//! CREATE TABLE <table> (id BIGSERIAL PRIMARY KEY, data JSONB NOT NULL)
//! ```
//!
//! Index lookups match the text value of a top-level document field.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::config::TableOptions;
use crate::error::{CacheResult, StoreError, StoreResult};
use crate::table_cache::TableCache;
use crate::traits::{Record, RecordStore};

/// Default number of rows fetched per scan page
pub const DEFAULT_SCAN_PAGE_SIZE: i64 = 1000;

/// Connection level configuration of a [`PgRecordStore`]
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    scan_page_size: i64,
}

impl Default for PgStoreConfig {
    fn default() -> Self {
        Self {
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

impl PgStoreConfig {
    /// Set the rows fetched per round trip during a full table scan.
    /// Values below one are raised to one.
    pub fn with_scan_page_size(mut self, scan_page_size: i64) -> Self {
        self.scan_page_size = scan_page_size.max(1);
        self
    }

    /// Rows fetched per round trip during a full table scan
    pub fn scan_page_size(&self) -> i64 {
        self.scan_page_size.max(1)
    }
}

/// A record store reading JSONB documents from PostgreSQL tables
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    config: PgStoreConfig,
}

impl PgRecordStore {
    /// Create a store with the default configuration
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, PgStoreConfig::default())
    }

    /// Create a store with the given configuration
    pub fn with_config(pool: PgPool, config: PgStoreConfig) -> Self {
        Self { pool, config }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the store configuration
    pub fn config(&self) -> &PgStoreConfig {
        &self.config
    }
}

/// Returns `table` as a quoted SQL identifier.
///
/// Only ASCII letters, digits and underscores are accepted, starting with a
/// letter or underscore. Quoting keeps reserved words such as `order` usable
/// and makes the name case-sensitive.
fn quoted_table_name(table: &str) -> StoreResult<String> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && table.len() <= 63 {
        Ok(format!("\"{table}\""))
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> StoreResult<(i64, Record)> {
    let id: i64 = row.try_get("id")?;
    let Json(data): Json<serde_json::Value> = row.try_get("data")?;
    match data {
        serde_json::Value::Object(record) => Ok((id, record)),
        other => Err(StoreError::InvalidRecord(format!(
            "row {id} holds a non-object document: {other}"
        ))),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn scan(&self, table: &str) -> StoreResult<Vec<Record>> {
        let quoted = quoted_table_name(table)?;
        let sql = format!("SELECT id, data FROM {quoted} WHERE id > $1 ORDER BY id LIMIT $2");
        let page_size = self.config.scan_page_size();

        let mut records = Vec::new();
        let mut last_id = 0i64;
        loop {
            let mut rows = sqlx::query(&sql)
                .bind(last_id)
                .bind(page_size)
                .fetch(&self.pool);

            let mut page_len = 0i64;
            while let Some(row) = rows.try_next().await? {
                let (id, record) = decode_row(&row)?;
                last_id = id;
                records.push(record);
                page_len += 1;
            }
            debug!("Scanned page of {} rows from '{}'", page_len, table);

            if page_len < page_size {
                return Ok(records);
            }
        }
    }

    async fn query(&self, table: &str, index_name: &str, key: &str) -> StoreResult<Option<Record>> {
        let quoted = quoted_table_name(table)?;
        let sql = format!("SELECT id, data FROM {quoted} WHERE data->>$1 = $2 ORDER BY id LIMIT 1");

        let row = sqlx::query(&sql)
            .bind(index_name)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(decode_row)
            .transpose()
            .map(|found| found.map(|(_, record)| record))
    }
}

impl TableCache<PgRecordStore> {
    /// Creates a table cache over a PostgreSQL table. Performs no I/O.
    pub fn connect(
        table: impl Into<String>,
        options: TableOptions,
        pool: PgPool,
        config: PgStoreConfig,
    ) -> CacheResult<Self> {
        Self::new(table, options, PgRecordStore::with_config(pool, config))
    }
}

/// Creates the document table if it does not exist
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use table_cache::ensure_table;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// ensure_table(pool, "users").await?;
/// # Ok(())
/// # }
/// ```
pub async fn ensure_table(pool: &PgPool, table: &str) -> StoreResult<()> {
    let quoted = quoted_table_name(table)?;
    let sql = format!("CREATE TABLE IF NOT EXISTS {quoted} (id BIGSERIAL PRIMARY KEY, data JSONB NOT NULL)");
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Drops the document table if it exists
pub async fn drop_table(pool: &PgPool, table: &str) -> StoreResult<()> {
    let quoted = quoted_table_name(table)?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {quoted}"))
        .execute(pool)
        .await?;
    Ok(())
}
