//! Token manager configuration.
//!
//! Loaded from TOML (or any serde format). Every field has a default, so a
//! minimal HMAC setup only needs a secret:
//!
//! ```toml
//! secret = "change-me"
//! algo = "HS256"
//! blacklist_ttl = "7d"
//! persistent_claims = ["tenant"]
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JwtError;
use crate::provider::registry::DEFAULT_DRIVER;
use crate::provider::{KeyBundle, SignerConfig, SigningAlgorithm};
use crate::storage::blacklist::DEFAULT_BLACKLIST_TTL;
use crate::validation::{ValidationConfig, ValidatorRegistry};

/// Name of the default storage backend.
pub const DEFAULT_STORAGE: &str = "tagged";

/// Settings for [`JwtManager`](crate::JwtManager).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Signing provider driver.
    pub driver: String,

    /// Shared secret for HMAC algorithms.
    pub secret: Option<String>,

    /// Signing algorithm name, e.g. `"HS256"` or `"ES384"`.
    pub algo: String,

    /// Key pair for RSA and ECDSA algorithms.
    pub keys: KeyBundle,

    /// Allowed clock skew in seconds for temporal claims.
    pub leeway: u64,

    /// Whether tokens get a `jti` and can be revoked.
    pub blacklist_enabled: bool,

    /// How long a revoked `jti` is remembered.
    #[serde(with = "humantime_serde")]
    pub blacklist_ttl: Duration,

    /// Revocation storage backend, resolved through a
    /// [`StorageRegistry`](crate::storage::StorageRegistry).
    pub storage: String,

    /// Claims carried over to the new token on refresh.
    pub persistent_claims: Vec<String>,

    /// Validators run on decode, in order.
    pub validations: Vec<String>,

    /// Extra options passed to validator factories.
    pub validation_options: BTreeMap<String, serde_json::Value>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            secret: None,
            algo: SigningAlgorithm::HS256.as_str().to_string(),
            keys: KeyBundle::default(),
            leeway: 0,
            blacklist_enabled: true,
            blacklist_ttl: DEFAULT_BLACKLIST_TTL,
            storage: DEFAULT_STORAGE.to_string(),
            persistent_claims: Vec::new(),
            validations: vec![
                ValidatorRegistry::EXPIRATION.to_string(),
                ValidatorRegistry::NOT_BEFORE.to_string(),
            ],
            validation_options: BTreeMap::new(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl From<ConfigError> for JwtError {
    fn from(err: ConfigError) -> Self {
        JwtError::configuration(err.to_string())
    }
}

impl JwtConfig {
    /// Parses configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the document does not parse.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// Key material is not inspected here. The provider resolves it on first
    /// use, so a missing secret or key surfaces from `encode`/`decode`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the algorithm name is not supported
    /// - the blacklist is enabled with a zero TTL
    ///
    /// Returns `ConfigError::Missing` if the driver or storage name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        SigningAlgorithm::from_str(&self.algo).map_err(|_| {
            ConfigError::InvalidValue(format!("unsupported algorithm '{}'", self.algo))
        })?;

        if self.driver.is_empty() {
            return Err(ConfigError::Missing("driver".to_string()));
        }
        if self.storage.is_empty() {
            return Err(ConfigError::Missing("storage".to_string()));
        }
        if self.blacklist_enabled && self.blacklist_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "blacklist_ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Provider settings derived from this configuration.
    #[must_use]
    pub fn signer_config(&self) -> SignerConfig {
        SignerConfig {
            algorithm: self.algo.clone(),
            secret: self.secret.clone(),
            keys: self.keys.clone(),
        }
    }

    /// Validator settings derived from this configuration.
    #[must_use]
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            leeway: self.leeway,
            options: self.validation_options.clone(),
        }
    }
}
