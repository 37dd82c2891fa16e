//! Revocation storage.
//!
//! [`Storage`] is the key/value contract the blacklist persists into. Cache
//! backed implementations live in the `jwtguard-cache` crate; anything else
//! that can keep a string under a key with an optional expiry will do.
//!
//! # Implementation Notes
//!
//! - `get` on a missing or expired key returns `Ok(None)`, never an error
//! - writes to the same key are last-write-wins
//! - `flush` removes what *this* store manages; backends without namespacing
//!   may clear more than that and must document it

pub mod blacklist;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use blacklist::Blacklist;
pub use registry::{StorageFactory, StorageRegistry};

use async_trait::async_trait;

use crate::JwtResult;

/// Key/value persistence with optional expiry.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stores `value` under `key` for `ttl_minutes` minutes.
    ///
    /// Returns whether the write was accepted.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Storage`](crate::JwtError::Storage) if the backend fails.
    async fn add(&self, key: &str, value: &str, ttl_minutes: u64) -> JwtResult<bool>;

    /// Stores `value` under `key` with no expiry.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Storage`](crate::JwtError::Storage) if the backend fails.
    async fn forever(&self, key: &str, value: &str) -> JwtResult<bool>;

    /// Looks up `key`.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Storage`](crate::JwtError::Storage) if the backend fails.
    /// An absent key is `Ok(None)`.
    async fn get(&self, key: &str) -> JwtResult<Option<String>>;

    /// Removes `key`, returning whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Storage`](crate::JwtError::Storage) if the backend fails.
    async fn destroy(&self, key: &str) -> JwtResult<bool>;

    /// Removes every record this store manages.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Storage`](crate::JwtError::Storage) if the backend fails.
    async fn flush(&self) -> JwtResult<()>;
}
