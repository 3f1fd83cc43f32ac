/// Error type for failures surfaced by a record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Store request failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for table cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for table cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(feature = "sqlx-store")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(Box::new(err))
    }
}
