//! Token lifecycle: encode, decode, refresh and invalidate.
//!
//! [`JwtManager`] ties a [`SigningProvider`], a [`ValidationPipeline`] and a
//! [`Blacklist`] together. Encoding is synchronous; anything that may touch
//! the revocation store is `async` and runs on the caller's task.
//!
//! ```ignore
//! let manager = JwtManager::from_config(&config, storage)?;
//!
//! let token = manager.encode(ClaimSet::new().with("sub", "user-1"))?;
//! let claims = manager.decode(&token).await?;
//! let fresh = manager.refresh(&token, false).await?;
//! manager.invalidate(&fresh, false).await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::JwtResult;
use crate::claims::{ClaimSet, registered};
use crate::config::JwtConfig;
use crate::error::JwtError;
use crate::provider::{ProviderRegistry, SigningProvider};
use crate::storage::blacklist::DEFAULT_BLACKLIST_TTL;
use crate::storage::{Blacklist, Storage, StorageRegistry};
use crate::validation::{Clock, SystemClock, ValidationPipeline, ValidatorRegistry};

/// Checks applied by [`JwtManager::decode_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Run the validation pipeline.
    pub validate: bool,

    /// Reject blacklisted tokens (only when the blacklist is enabled).
    pub check_revocation: bool,
}

impl DecodeOptions {
    /// Signature check only.
    pub const UNCHECKED: Self = Self {
        validate: false,
        check_revocation: false,
    };
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            validate: true,
            check_revocation: true,
        }
    }
}

/// Name-keyed registries consulted by [`JwtManager::from_registries`].
#[derive(Clone, Default)]
pub struct Registries {
    /// Signing provider drivers.
    pub providers: ProviderRegistry,
    /// Claim validators.
    pub validators: ValidatorRegistry,
    /// Revocation storage backends.
    pub storage: StorageRegistry,
}

// =============================================================================
// Manager
// =============================================================================

/// Issues, verifies, refreshes and revokes tokens.
pub struct JwtManager {
    provider: Arc<dyn SigningProvider>,
    blacklist: Blacklist,
    pipeline: ValidationPipeline,
    persistent_claims: Vec<String>,
    blacklist_enabled: bool,
    clock: Arc<dyn Clock>,
}

impl JwtManager {
    /// Starts building a manager around `provider` and `storage`.
    #[must_use]
    pub fn builder(
        provider: Arc<dyn SigningProvider>,
        storage: Arc<dyn Storage>,
    ) -> JwtManagerBuilder {
        JwtManagerBuilder::new(provider, storage)
    }

    /// Builds a manager from configuration with the built-in drivers and
    /// validators.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] if the configuration is invalid or
    /// names an unknown driver or validator. Key material is resolved on
    /// first use, so a missing secret or key is reported by `encode` and
    /// `decode` rather than here.
    pub fn from_config(config: &JwtConfig, storage: Arc<dyn Storage>) -> JwtResult<Self> {
        config.validate()?;
        Self::assemble(config, &Registries::default(), storage)
    }

    /// Builds a manager from configuration, resolving the driver, validators
    /// and storage backend by name.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] if the configuration is invalid or
    /// any name is not registered.
    pub fn from_registries(config: &JwtConfig, registries: &Registries) -> JwtResult<Self> {
        config.validate()?;
        let storage = registries.storage.build(&config.storage)?;
        Self::assemble(config, registries, storage)
    }

    fn assemble(
        config: &JwtConfig,
        registries: &Registries,
        storage: Arc<dyn Storage>,
    ) -> JwtResult<Self> {
        let provider = registries
            .providers
            .build(&config.driver, &config.signer_config())?;
        let pipeline = ValidationPipeline::new(
            config.validations.iter().cloned(),
            registries.validators.clone(),
            config.validation_config(),
        )?;

        Ok(Self::builder(provider, storage)
            .pipeline(pipeline)
            .persistent_claims(config.persistent_claims.iter().cloned())
            .blacklist_enabled(config.blacklist_enabled)
            .blacklist_ttl(config.blacklist_ttl)
            .build())
    }

    /// Signs a claim set.
    ///
    /// With the blacklist enabled, a fresh `jti` replaces any value the
    /// caller supplied.
    ///
    /// # Errors
    ///
    /// Returns whatever the provider reports, typically
    /// [`JwtError::Encoding`] or [`JwtError::Configuration`].
    pub fn encode(&self, mut claims: ClaimSet) -> JwtResult<String> {
        if self.blacklist_enabled {
            claims.insert(registered::JWT_ID, Uuid::new_v4().to_string());
        }
        self.provider.encode(&claims)
    }

    /// Decodes a token with validation and revocation checks.
    ///
    /// # Errors
    ///
    /// See [`decode_with`](Self::decode_with).
    pub async fn decode(&self, token: &str) -> JwtResult<ClaimSet> {
        self.decode_with(token, DecodeOptions::default()).await
    }

    /// Decodes a token, applying the selected checks.
    ///
    /// Tokens without a `jti` are never considered revoked.
    ///
    /// # Errors
    ///
    /// - [`JwtError::TokenMalformed`] or [`JwtError::TokenInvalid`] if the
    ///   token does not parse or verify
    /// - the first validator failure, e.g. [`JwtError::TokenExpired`]
    /// - [`JwtError::TokenRevoked`] if the token is blacklisted
    /// - [`JwtError::Storage`] if the blacklist lookup fails
    pub async fn decode_with(&self, token: &str, options: DecodeOptions) -> JwtResult<ClaimSet> {
        let claims = self.provider.decode(token)?;

        if options.validate {
            self.pipeline.run(&claims, self.clock.now())?;
        }

        if self.blacklist_enabled
            && options.check_revocation
            && claims.jwt_id().is_some()
            && self.blacklist.has(&claims).await?
        {
            tracing::debug!(jti = ?claims.jwt_id(), "rejected revoked token");
            return Err(JwtError::TokenRevoked);
        }

        Ok(claims)
    }

    /// Exchanges a valid token for a new one.
    ///
    /// The new token carries the configured persistent claims present in the
    /// old one, plus its `sub` and its original `iat`. With the blacklist
    /// enabled the old token is revoked *before* the new one is signed, so a
    /// signing failure leaves the caller with neither.
    ///
    /// # Errors
    ///
    /// Any error from [`decode`](Self::decode), from revoking the old token,
    /// or from [`encode`](Self::encode).
    pub async fn refresh(&self, token: &str, force_forever: bool) -> JwtResult<String> {
        let claims = self.decode(token).await?;

        let mut renewed = claims.subset(&self.persistent_claims);
        for name in [registered::SUBJECT, registered::ISSUED_AT] {
            if let Some(value) = claims.get(name) {
                renewed.insert(name, value.clone());
            }
        }

        if self.blacklist_enabled {
            self.revoke(&claims, force_forever).await?;
        }

        tracing::debug!(sub = ?claims.subject(), "refreshing token");
        self.encode(renewed)
    }

    /// Blacklists a token.
    ///
    /// The token only needs a valid signature; expired or already revoked
    /// tokens can still be invalidated. Returns whether the store accepted
    /// the write.
    ///
    /// # Errors
    ///
    /// - [`JwtError::RevocationDisabled`] if the blacklist is disabled
    /// - [`JwtError::TokenInvalid`] if the token has no `jti`
    /// - decode and storage errors
    pub async fn invalidate(&self, token: &str, force_forever: bool) -> JwtResult<bool> {
        if !self.blacklist_enabled {
            return Err(JwtError::RevocationDisabled);
        }
        let claims = self.decode_with(token, DecodeOptions::UNCHECKED).await?;
        self.revoke(&claims, force_forever).await
    }

    async fn revoke(&self, claims: &ClaimSet, force_forever: bool) -> JwtResult<bool> {
        if force_forever {
            self.blacklist.add_forever(claims).await
        } else {
            self.blacklist.add(claims).await
        }
    }

    /// The signing provider.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn SigningProvider> {
        &self.provider
    }

    /// The blacklist, usable even when revocation checks are disabled.
    #[must_use]
    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    /// The validation pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &ValidationPipeline {
        &self.pipeline
    }

    /// Claims carried over on refresh.
    #[must_use]
    pub fn persistent_claims(&self) -> &[String] {
        &self.persistent_claims
    }

    /// Returns `true` if tokens are tracked for revocation.
    #[must_use]
    pub fn is_blacklist_enabled(&self) -> bool {
        self.blacklist_enabled
    }
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("algorithm", &self.provider.algorithm())
            .field("blacklist", &self.blacklist)
            .field("pipeline", &self.pipeline)
            .field("persistent_claims", &self.persistent_claims)
            .field("blacklist_enabled", &self.blacklist_enabled)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`JwtManager`].
pub struct JwtManagerBuilder {
    provider: Arc<dyn SigningProvider>,
    storage: Arc<dyn Storage>,
    pipeline: Option<ValidationPipeline>,
    persistent_claims: Vec<String>,
    blacklist_enabled: bool,
    blacklist_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtManagerBuilder {
    fn new(provider: Arc<dyn SigningProvider>, storage: Arc<dyn Storage>) -> Self {
        Self {
            provider,
            storage,
            pipeline: None,
            persistent_claims: Vec::new(),
            blacklist_enabled: true,
            blacklist_ttl: DEFAULT_BLACKLIST_TTL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the validation pipeline. Defaults to
    /// [`ValidationPipeline::standard`].
    #[must_use]
    pub fn pipeline(mut self, pipeline: ValidationPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the claims carried over on refresh.
    #[must_use]
    pub fn persistent_claims<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persistent_claims = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables revocation tracking. Enabled by default.
    #[must_use]
    pub fn blacklist_enabled(mut self, enabled: bool) -> Self {
        self.blacklist_enabled = enabled;
        self
    }

    /// Sets how long revoked tokens are remembered.
    #[must_use]
    pub fn blacklist_ttl(mut self, ttl: Duration) -> Self {
        self.blacklist_ttl = ttl;
        self
    }

    /// Sets the time source for validation and blacklist entries.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the manager.
    #[must_use]
    pub fn build(self) -> JwtManager {
        let blacklist = Blacklist::new(self.storage)
            .with_ttl(self.blacklist_ttl)
            .with_clock(Arc::clone(&self.clock));
        JwtManager {
            provider: self.provider,
            blacklist,
            pipeline: self.pipeline.unwrap_or_else(ValidationPipeline::standard),
            persistent_claims: self.persistent_claims,
            blacklist_enabled: self.blacklist_enabled,
            clock: self.clock,
        }
    }
}
