//! Token blacklist keyed by `jti`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::Storage;
use crate::JwtResult;
use crate::claims::ClaimSet;
use crate::error::JwtError;
use crate::validation::{Clock, SystemClock};

/// Default time a revoked `jti` is remembered: 14 days.
pub const DEFAULT_BLACKLIST_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Records revoked tokens in a [`Storage`] backend.
///
/// Entries are keyed by the token's `jti` claim and hold the Unix time of
/// revocation. Entries written with [`add`](Self::add) expire after the
/// configured TTL, rounded up to whole minutes.
#[derive(Clone)]
pub struct Blacklist {
    storage: Arc<dyn Storage>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Blacklist {
    /// Creates a blacklist with the default TTL.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            ttl: DEFAULT_BLACKLIST_TTL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets how long revoked entries are kept.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the clock used to stamp entries.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured TTL in whole minutes, never less than one.
    #[must_use]
    pub fn ttl_minutes(&self) -> u64 {
        self.ttl.as_secs().div_ceil(60).max(1)
    }

    /// Underlying store.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Blacklists the token for the configured TTL.
    ///
    /// # Errors
    ///
    /// - [`JwtError::TokenInvalid`] if the claims have no `jti`
    /// - [`JwtError::Storage`] if the write fails
    pub async fn add(&self, claims: &ClaimSet) -> JwtResult<bool> {
        let jti = Self::key(claims)?;
        let minutes = self.ttl_minutes();
        let stored = self
            .storage
            .add(jti, &self.marker(), minutes)
            .await
            .inspect_err(|e| tracing::warn!(jti = %jti, error = %e, "failed to blacklist token"))?;
        tracing::debug!(jti = %jti, ttl_minutes = minutes, "token blacklisted");
        Ok(stored)
    }

    /// Blacklists the token with no expiry.
    ///
    /// # Errors
    ///
    /// - [`JwtError::TokenInvalid`] if the claims have no `jti`
    /// - [`JwtError::Storage`] if the write fails
    pub async fn add_forever(&self, claims: &ClaimSet) -> JwtResult<bool> {
        let jti = Self::key(claims)?;
        let stored = self
            .storage
            .forever(jti, &self.marker())
            .await
            .inspect_err(|e| tracing::warn!(jti = %jti, error = %e, "failed to blacklist token"))?;
        tracing::debug!(jti = %jti, "token blacklisted permanently");
        Ok(stored)
    }

    /// Returns `true` if the token is blacklisted.
    ///
    /// # Errors
    ///
    /// - [`JwtError::TokenInvalid`] if the claims have no `jti`
    /// - [`JwtError::Storage`] if the lookup fails
    pub async fn has(&self, claims: &ClaimSet) -> JwtResult<bool> {
        let jti = Self::key(claims)?;
        let entry = self
            .storage
            .get(jti)
            .await
            .inspect_err(|e| tracing::warn!(jti = %jti, error = %e, "blacklist lookup failed"))?;
        Ok(entry.is_some())
    }

    /// Unix time at which the token was blacklisted, if it is.
    ///
    /// # Errors
    ///
    /// Same as [`has`](Self::has).
    pub async fn revoked_at(&self, claims: &ClaimSet) -> JwtResult<Option<i64>> {
        let jti = Self::key(claims)?;
        let entry = self.storage.get(jti).await?;
        Ok(entry.and_then(|value| value.parse().ok()))
    }

    /// Removes the token from the blacklist.
    ///
    /// # Errors
    ///
    /// - [`JwtError::TokenInvalid`] if the claims have no `jti`
    /// - [`JwtError::Storage`] if the delete fails
    pub async fn remove(&self, claims: &ClaimSet) -> JwtResult<bool> {
        let jti = Self::key(claims)?;
        let removed = self.storage.destroy(jti).await?;
        tracing::debug!(jti = %jti, removed, "token removed from blacklist");
        Ok(removed)
    }

    /// Empties the blacklist.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Storage`] if the backend fails.
    pub async fn clear(&self) -> JwtResult<()> {
        self.storage
            .flush()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to clear blacklist"))?;
        tracing::debug!("blacklist cleared");
        Ok(())
    }

    fn key(claims: &ClaimSet) -> JwtResult<&str> {
        claims
            .jwt_id()
            .ok_or_else(|| JwtError::invalid("token has no jti claim"))
    }

    fn marker(&self) -> String {
        self.clock.now().to_string()
    }
}

impl fmt::Debug for Blacklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blacklist")
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
