//! Driver registry for signing providers.
//!
//! The `driver` configuration option names a provider implementation. Names
//! resolve through an explicit table at configuration-load time, so a typo
//! fails before the first token is issued.

use std::collections::HashMap;
use std::sync::Arc;

use super::{JwtProvider, SignerConfig, SigningProvider};
use crate::JwtResult;
use crate::error::JwtError;

/// Builds a provider from signer settings.
pub type ProviderFactory =
    Arc<dyn Fn(&SignerConfig) -> JwtResult<Arc<dyn SigningProvider>> + Send + Sync>;

/// Name of the built-in `jsonwebtoken`-backed driver.
pub const DEFAULT_DRIVER: &str = "jsonwebtoken";

/// Lookup table from driver name to provider factory.
#[derive(Clone)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Creates a registry containing only the built-in driver
    /// (registered as `jsonwebtoken` and `default`).
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let builtin: ProviderFactory =
            Arc::new(|config: &SignerConfig| -> JwtResult<Arc<dyn SigningProvider>> {
                Ok(Arc::new(JwtProvider::new(config)?))
            });
        registry.register_factory(DEFAULT_DRIVER, builtin.clone());
        registry.register_factory("default", builtin);
        registry
    }

    /// Creates a registry with no drivers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers (or replaces) a driver.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&SignerConfig) -> JwtResult<Arc<dyn SigningProvider>> + Send + Sync + 'static,
    {
        self.register_factory(name, Arc::new(factory));
    }

    fn register_factory(&mut self, name: impl Into<String>, factory: ProviderFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Returns `true` if a driver with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds a provider with the named driver.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] for an unknown driver, or whatever
    /// the driver's factory reports.
    pub fn build(&self, name: &str, config: &SignerConfig) -> JwtResult<Arc<dyn SigningProvider>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| JwtError::configuration(format!("unknown provider driver '{name}'")))?;
        tracing::debug!(driver = %name, algorithm = %config.algorithm, "building signing provider");
        factory(config)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
