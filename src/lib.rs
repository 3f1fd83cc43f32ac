//! # Table Cache
//!
//! This crate provides a read-through, in-process cache in front of a keyed table store.
//! Lookups are served from an expiring multi-index cache and fall back to the store
//! according to a configurable miss policy.
//!
//! ## Key Components
//!
//! - `TableCache`: Read-through facade over one table (`fill`, `get`, `remove`, `clear`)
//! - `TableOptions` and `TableDescriptor`: Table configuration and its validated form
//! - `ExpiringIndexCache`: Default cache, addressable by every configured index
//! - `RecordStore` and `IndexCache`: Traits for the store and cache collaborators
//! - `MemoryRecordStore`: In-process table store
//! - `PgRecordStore`: PostgreSQL-backed table store (feature `sqlx-store`)
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use table_cache::{MemoryRecordStore, MissPolicy, TableCache, TableOptions};
//!
//! # async fn example() -> Result<(), table_cache::CacheError> {
//! let store = MemoryRecordStore::new();
//! store.insert("users", json!({ "userName": "alice", "email": "alice@example.com" })
//!     .as_object().cloned().unwrap_or_default());
//!
//! let options = TableOptions::new(["userName", "email"])
//!     .with_expire(60)
//!     .with_if_not_found(MissPolicy::TargetedFetch);
//! let users = TableCache::new("users", options, store)?;
//!
//! let alice = users.get("alice@example.com", Some("email")).await?;
//! assert!(alice.is_some());
//! # Ok(())
//! # }
//! ```

mod error;
mod traits;
mod config;
mod cache;
mod store;
mod table_cache;
#[cfg(feature = "sqlx-store")]
mod pg;

pub use error::{CacheError, CacheResult, StoreError, StoreResult};
pub use traits::{index_value, IndexCache, Record, RecordStore};
pub use config::{MissPolicy, TableDescriptor, TableOptions};
pub use cache::{CacheStatistics, ExpiringIndexCache};
pub use store::MemoryRecordStore;
pub use table_cache::TableCache;

#[cfg(feature = "sqlx-store")]
pub use pg::{
    drop_table,
    ensure_table,
    PgRecordStore,
    PgStoreConfig,
    DEFAULT_SCAN_PAGE_SIZE,
};
