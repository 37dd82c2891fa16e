//! [`Storage`] adapters over a [`Cache`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jwtguard::storage::{Storage, StorageRegistry};
use jwtguard::{JwtError, JwtResult};

use crate::cache::{Cache, CacheError, TaggableCache};

/// Tag the blacklist's records live under.
pub const BLACKLIST_TAG: &str = "jwtguard.blacklist";

/// Registry name of [`CacheStorage`].
pub const CACHE_BACKEND: &str = "cache";

/// Registry name of [`TaggedCacheStorage`].
pub const TAGGED_BACKEND: &str = "tagged";

fn storage_error(err: CacheError) -> JwtError {
    JwtError::storage(err.to_string())
}

/// Storage over a plain cache.
///
/// `flush` clears the **entire** cache, including entries that have nothing
/// to do with token revocation. Use [`TaggedCacheStorage`] when the cache is
/// shared with other data.
#[derive(Clone)]
pub struct CacheStorage {
    cache: Arc<dyn Cache>,
}

impl CacheStorage {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Storage for CacheStorage {
    async fn add(&self, key: &str, value: &str, ttl_minutes: u64) -> JwtResult<bool> {
        let ttl = Duration::from_secs(ttl_minutes.saturating_mul(60));
        self.cache.put(key, value, ttl).await.map_err(storage_error)
    }

    async fn forever(&self, key: &str, value: &str) -> JwtResult<bool> {
        self.cache.forever(key, value).await.map_err(storage_error)
    }

    async fn get(&self, key: &str) -> JwtResult<Option<String>> {
        self.cache.get(key).await.map_err(storage_error)
    }

    async fn destroy(&self, key: &str) -> JwtResult<bool> {
        self.cache.forget(key).await.map_err(storage_error)
    }

    async fn flush(&self) -> JwtResult<()> {
        self.cache.flush().await.map_err(storage_error)
    }
}

/// Storage over a tagged cache view.
///
/// Records are written under [`BLACKLIST_TAG`], so `flush` only clears
/// revocation records.
#[derive(Clone)]
pub struct TaggedCacheStorage {
    inner: CacheStorage,
}

impl TaggedCacheStorage {
    /// Stores records under [`BLACKLIST_TAG`].
    pub fn new<C: TaggableCache + ?Sized>(cache: &C) -> Self {
        Self::with_tag(cache, BLACKLIST_TAG)
    }

    /// Stores records under a custom tag.
    pub fn with_tag<C: TaggableCache + ?Sized>(cache: &C, tag: &str) -> Self {
        Self {
            inner: CacheStorage::new(cache.tagged(tag)),
        }
    }
}

#[async_trait]
impl Storage for TaggedCacheStorage {
    async fn add(&self, key: &str, value: &str, ttl_minutes: u64) -> JwtResult<bool> {
        self.inner.add(key, value, ttl_minutes).await
    }

    async fn forever(&self, key: &str, value: &str) -> JwtResult<bool> {
        self.inner.forever(key, value).await
    }

    async fn get(&self, key: &str) -> JwtResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn destroy(&self, key: &str) -> JwtResult<bool> {
        self.inner.destroy(key).await
    }

    async fn flush(&self) -> JwtResult<()> {
        self.inner.flush().await
    }
}

/// Registers [`CACHE_BACKEND`] and [`TAGGED_BACKEND`] over `cache`.
pub fn register_backends<C>(registry: &mut StorageRegistry, cache: C)
where
    C: TaggableCache + Clone + 'static,
{
    let plain = cache.clone();
    registry.register(CACHE_BACKEND, move || {
        Ok(Arc::new(CacheStorage::new(Arc::new(plain.clone()))) as Arc<dyn Storage>)
    });
    registry.register(TAGGED_BACKEND, move || {
        Ok(Arc::new(TaggedCacheStorage::new(&cache)) as Arc<dyn Storage>)
    });
}
