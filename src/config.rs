use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Deserializer};

use crate::error::{CacheError, CacheResult};

/// What a table cache does when a lookup misses the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissPolicy {
    /// Return the absent result without touching the store
    #[default]
    NoAction,
    /// Refill the whole cache from a table scan, then look again
    FullRefill,
    /// Query the store for the single key and cache what comes back
    TargetedFetch,
}

impl FromStr for MissPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fill" => Ok(MissPolicy::FullRefill),
            "get" => Ok(MissPolicy::TargetedFetch),
            other => Err(CacheError::Configuration(format!(
                "unknown ifNotFound policy '{other}', expected 'fill' or 'get'"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for MissPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(MissPolicy::NoAction),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Options for a table cache.
///
/// Deserializes from the camelCase option bag
/// `{ "indexes": [...], "expire": 60, "fillIfEmpty": true, "ifNotFound": "get" }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    /// Index field names; the first one is the primary index
    #[serde(default)]
    pub indexes: Vec<String>,
    /// Default time-to-live of cache entries in seconds
    #[serde(default)]
    pub expire: Option<u64>,
    /// Fill the cache before a lookup when it looks empty
    #[serde(default)]
    pub fill_if_empty: bool,
    /// Miss handling policy
    #[serde(default)]
    pub if_not_found: MissPolicy,
}

impl TableOptions {
    /// Create options for the given index names
    pub fn new<I, S>(indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indexes: indexes.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the default time-to-live in seconds
    pub fn with_expire(mut self, seconds: u64) -> Self {
        self.expire = Some(seconds);
        self
    }

    /// Fill the cache before a lookup when it looks empty
    pub fn with_fill_if_empty(mut self, fill_if_empty: bool) -> Self {
        self.fill_if_empty = fill_if_empty;
        self
    }

    /// Set the miss handling policy
    pub fn with_if_not_found(mut self, policy: MissPolicy) -> Self {
        self.if_not_found = policy;
        self
    }

    /// Parse options from a JSON option bag
    pub fn from_json(value: serde_json::Value) -> CacheResult<Self> {
        serde_json::from_value(value).map_err(|e| CacheError::Configuration(e.to_string()))
    }
}

/// Validated, immutable configuration of a cached table
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    table: String,
    options: TableOptions,
}

impl TableDescriptor {
    /// Validates the table name and options.
    ///
    /// Fails when the table name is empty or no index is configured.
    pub fn new(table: impl Into<String>, options: TableOptions) -> CacheResult<Self> {
        let table = table.into();
        if table.is_empty() {
            return Err(CacheError::Configuration("table name must be provided".to_string()));
        }
        if options.indexes.is_empty() {
            return Err(CacheError::Configuration("indexes must be provided".to_string()));
        }
        if let Some(index) = options.indexes.iter().find(|index| index.is_empty()) {
            return Err(CacheError::Configuration(format!(
                "index names must not be empty, got {index:?} in {:?}",
                options.indexes
            )));
        }
        Ok(Self { table, options })
    }

    /// The table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Index field names, primary index first
    pub fn indexes(&self) -> &[String] {
        &self.options.indexes
    }

    /// The index used when a lookup names none
    pub fn primary_index(&self) -> &str {
        &self.options.indexes[0]
    }

    /// Checks if `index_name` is one of the configured indexes
    pub fn has_index(&self, index_name: &str) -> bool {
        self.options.indexes.iter().any(|index| index == index_name)
    }

    /// Default entry time-to-live; `None` when entries never expire
    pub fn expire(&self) -> Option<Duration> {
        self.options
            .expire
            .filter(|&seconds| seconds > 0)
            .map(Duration::from_secs)
    }

    /// Whether an empty cache is filled before a lookup
    pub fn fill_if_empty(&self) -> bool {
        self.options.fill_if_empty
    }

    /// What a lookup does on a cache miss
    pub fn miss_policy(&self) -> MissPolicy {
        self.options.if_not_found
    }
}
