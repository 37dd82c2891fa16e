//! Named storage backends.

use std::collections::HashMap;
use std::sync::Arc;

use super::Storage;
use crate::JwtResult;
use crate::error::JwtError;

/// Builds a storage backend.
pub type StorageFactory = Arc<dyn Fn() -> JwtResult<Arc<dyn Storage>> + Send + Sync>;

/// Lookup table from backend name to storage factory.
///
/// The core crate registers nothing; backend crates add their own entries.
#[derive(Clone, Default)]
pub struct StorageRegistry {
    factories: HashMap<String, StorageFactory>,
}

impl StorageRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a backend.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> JwtResult<Arc<dyn Storage>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Returns `true` if a backend with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the named backend.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] for an unknown name, or whatever
    /// the factory reports.
    pub fn build(&self, name: &str) -> JwtResult<Arc<dyn Storage>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| JwtError::configuration(format!("unknown storage backend '{name}'")))?;
        tracing::debug!(backend = %name, "building revocation storage");
        factory()
    }
}
