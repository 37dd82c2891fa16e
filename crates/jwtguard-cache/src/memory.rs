//! In-process cache on `DashMap`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::{Cache, CacheError, CacheResult, TaggableCache};

/// A cached value with optional TTL.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub value: Arc<str>,
    pub cached_at: Instant,
    /// `None` for entries that never expire.
    pub ttl: Option<Duration>,
}

impl CachedEntry {
    /// Create an entry that expires after `ttl`.
    pub fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: Arc::from(value),
            cached_at: Instant::now(),
            ttl: Some(ttl),
        }
    }

    /// Create an entry that never expires.
    pub fn permanent(value: &str) -> Self {
        Self {
            value: Arc::from(value),
            cached_at: Instant::now(),
            ttl: None,
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.cached_at.elapsed() > ttl)
    }
}

struct Shared {
    entries: DashMap<String, CachedEntry>,
    /// Tag name to the namespaced keys written under it.
    tags: DashMap<String, HashSet<String>>,
    max_entries: Option<usize>,
}

/// Local cache shared by clones.
///
/// Expired entries are dropped lazily on read, and in bulk by
/// [`purge_expired`](Self::purge_expired). With an entry limit set, a write
/// into a full cache first purges expired entries and fails if that does
/// not free room.
#[derive(Clone)]
pub struct MemoryCache {
    shared: Arc<Shared>,
}

impl MemoryCache {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a cache holding at most `max_entries` entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self::build(Some(max_entries))
    }

    fn build(max_entries: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: DashMap::new(),
                tags: DashMap::new(),
                max_entries,
            }),
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.entries.is_empty()
    }

    /// Removes all expired entries, returning how many were dropped.
    ///
    /// The tag index is pruned of keys whose entries are gone, including
    /// entries already dropped on read.
    pub fn purge_expired(&self) -> usize {
        let before = self.shared.entries.len();
        self.shared.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.shared.entries.len());
        self.shared.tags.retain(|_, keys| {
            keys.retain(|key| self.shared.entries.contains_key(key));
            !keys.is_empty()
        });
        if removed > 0 {
            tracing::debug!(removed, "purged expired cache entries");
        }
        removed
    }

    fn read(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.shared.entries.get(key) {
            if !entry.is_expired() {
                return Some(entry.value.to_string());
            }
            drop(entry);
            self.shared
                .entries
                .remove_if(key, |_, entry| entry.is_expired());
        }
        None
    }

    fn write(&self, key: &str, entry: CachedEntry) -> CacheResult<bool> {
        if let Some(max_entries) = self.shared.max_entries {
            let full = |entries: &DashMap<String, CachedEntry>| {
                !entries.contains_key(key) && entries.len() >= max_entries
            };
            if full(&self.shared.entries) {
                self.purge_expired();
                if full(&self.shared.entries) {
                    tracing::warn!(max_entries, "cache at capacity, rejecting write");
                    return Err(CacheError::Capacity { max_entries });
                }
            }
        }
        self.shared.entries.insert(key.to_string(), entry);
        Ok(true)
    }

    fn remove(&self, key: &str) -> bool {
        self.shared
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired())
    }

    fn index(&self, tag: &str, key: &str) {
        self.shared
            .tags
            .entry(tag.to_string())
            .or_default()
            .insert(key.to_string());
    }

    fn unindex(&self, tag: &str, key: &str) {
        self.prune_tag(tag, |keys| {
            keys.remove(key);
        });
    }

    /// Unindexes `key` if its entry is no longer stored.
    fn unindex_stale(&self, tag: &str, key: &str) {
        self.prune_tag(tag, |keys| {
            if !self.shared.entries.contains_key(key) {
                keys.remove(key);
            }
        });
    }

    fn prune_tag(&self, tag: &str, prune: impl FnOnce(&mut HashSet<String>)) {
        if let Some(mut keys) = self.shared.tags.get_mut(tag) {
            prune(keys.value_mut());
        }
        self.shared.tags.remove_if(tag, |_, keys| keys.is_empty());
    }

    #[cfg(test)]
    fn indexed_keys(&self) -> usize {
        self.shared.tags.iter().map(|keys| keys.len()).sum()
    }

    fn flush_tag(&self, tag: &str) -> usize {
        let Some((_, keys)) = self.shared.tags.remove(tag) else {
            return 0;
        };
        for key in &keys {
            self.shared.entries.remove(key);
        }
        tracing::debug!(tag = %tag, removed = keys.len(), "flushed cache tag");
        keys.len()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.shared.entries.len())
            .field("tags", &self.shared.tags.len())
            .field("max_entries", &self.shared.max_entries)
            .finish()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.read(key))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        self.write(key, CachedEntry::new(value, ttl))
    }

    async fn forever(&self, key: &str, value: &str) -> CacheResult<bool> {
        self.write(key, CachedEntry::permanent(value))
    }

    async fn forget(&self, key: &str) -> CacheResult<bool> {
        Ok(self.remove(key))
    }

    async fn flush(&self) -> CacheResult<()> {
        self.shared.entries.clear();
        self.shared.tags.clear();
        tracing::debug!("flushed cache");
        Ok(())
    }
}

impl TaggableCache for MemoryCache {
    fn tagged(&self, tag: &str) -> Arc<dyn Cache> {
        Arc::new(TaggedCache {
            cache: self.clone(),
            tag: tag.to_string(),
        })
    }
}

// =============================================================================
// Tagged view
// =============================================================================

/// View of a [`MemoryCache`] scoped to one tag.
///
/// Keys are namespaced by the tag, so the same key under different tags (or
/// untagged) refers to different entries.
#[derive(Clone, Debug)]
pub struct TaggedCache {
    cache: MemoryCache,
    tag: String,
}

impl TaggedCache {
    /// The tag this view is scoped to.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn key(&self, key: &str) -> String {
        format!("tag:{}:{key}", self.tag)
    }
}

#[async_trait]
impl Cache for TaggedCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let key = self.key(key);
        let value = self.cache.read(&key);
        if value.is_none() {
            self.cache.unindex_stale(&self.tag, &key);
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        let key = self.key(key);
        let stored = self.cache.write(&key, CachedEntry::new(value, ttl))?;
        self.cache.index(&self.tag, &key);
        Ok(stored)
    }

    async fn forever(&self, key: &str, value: &str) -> CacheResult<bool> {
        let key = self.key(key);
        let stored = self.cache.write(&key, CachedEntry::permanent(value))?;
        self.cache.index(&self.tag, &key);
        Ok(stored)
    }

    async fn forget(&self, key: &str) -> CacheResult<bool> {
        let key = self.key(key);
        self.cache.unindex(&self.tag, &key);
        Ok(self.cache.remove(&key))
    }

    async fn flush(&self) -> CacheResult<()> {
        self.cache.flush_tag(&self.tag);
        Ok(())
    }
}
