//! Cache abstraction the storage adapters are written against.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Errors reported by cache backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The cache is full and no expired entries could be evicted.
    #[error("Cache at capacity ({max_entries} entries)")]
    Capacity {
        /// Configured entry limit.
        max_entries: usize,
    },

    /// The backend failed.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Type alias for cache results.
pub type CacheResult<T> = Result<T, CacheError>;

/// String key/value cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Looks up a live entry.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores an entry that expires after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// Stores an entry that never expires.
    async fn forever(&self, key: &str, value: &str) -> CacheResult<bool>;

    /// Removes an entry, returning whether a live one was present.
    async fn forget(&self, key: &str) -> CacheResult<bool>;

    /// Removes every entry in scope.
    async fn flush(&self) -> CacheResult<()>;
}

/// A cache that can hand out views scoped to a tag.
///
/// Entries written through a tagged view are only visible through views of
/// the same tag, and flushing the view removes only those entries.
pub trait TaggableCache: Cache {
    /// Returns a view scoped to `tag`.
    fn tagged(&self, tag: &str) -> Arc<dyn Cache>;
}
