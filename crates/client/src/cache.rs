//! Local cache backends.
//!
//! The dispatcher mirrors last-known state (customer, watch list, queued
//! events) into a key-value cache so it survives page loads or process
//! restarts. Values are JSON; keys are short fixed names.
//!
//! - [`MemoryCache`] - process-local, backed by `moka`
//! - [`FileCache`] - one JSON file per key in a directory

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use moka::future::Cache;
use serde_json::Value;
use thiserror::Error;

/// Cache key of the identified customer.
pub const CUSTOMER_KEY: &str = "customer";
/// Cache key of events awaiting identification or connectivity.
pub const TRACK_QUEUE_KEY: &str = "trackQueue";
/// Cache key of the back-in-stock watch list.
pub const WATCHING_KEY: &str = "backInStockWatching";

/// Upper bound on entries held by [`MemoryCache`].
const MEMORY_CACHE_CAPACITY: u64 = 1_000;

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value is not valid JSON.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Key cannot be stored by this backend.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// Key-value store for dispatcher state.
pub trait CacheStorage: Send + Sync {
    /// Read a value; `None` when the key is absent.
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<Value>, CacheError>> + Send;

    /// Store a value, replacing any previous one.
    fn set_item(&self, key: &str, value: Value) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Remove a value; removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Process-local cache.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Value>,
}

impl MemoryCache {
    /// Create an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::new(MEMORY_CACHE_CAPACITY),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStorage for MemoryCache {
    async fn get_item(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.entries.get(key).await)
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}

/// Directory-backed cache: `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Use `dir` for cache files; it is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CacheStorage for FileCache {
    async fn get_item(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let path = self.path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(&value)?).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path(key)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
