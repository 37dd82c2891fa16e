//! # jwtguard-cache
//!
//! Cache-backed revocation storage for `jwtguard`.
//!
//! - [`Cache`] / [`TaggableCache`] - the cache contract
//! - [`MemoryCache`] - in-process implementation on `DashMap`
//! - [`TaggedCacheStorage`] - blacklist records under [`BLACKLIST_TAG`];
//!   flushing leaves other cached data alone
//! - [`CacheStorage`] - blacklist records in a plain cache; flushing clears
//!   everything
//!
//! ```ignore
//! let cache = MemoryCache::new();
//! let storage = Arc::new(TaggedCacheStorage::new(&cache));
//! let manager = JwtManager::from_config(&config, storage)?;
//! ```

pub mod cache;
pub mod memory;
pub mod storage;

pub use cache::{Cache, CacheError, CacheResult, TaggableCache};
pub use memory::{CachedEntry, MemoryCache, TaggedCache};
pub use storage::{
    BLACKLIST_TAG, CACHE_BACKEND, CacheStorage, TAGGED_BACKEND, TaggedCacheStorage,
    register_backends,
};
