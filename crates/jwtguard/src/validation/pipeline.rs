//! Validator registry and the ordered pipeline built from it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use super::validators::{ExpirationValidator, IssuedAtValidator, NotBeforeValidator};
use super::{ClaimValidator, ValidationConfig};
use crate::JwtResult;
use crate::claims::ClaimSet;
use crate::error::JwtError;

/// Builds a validator from configuration.
pub type ValidatorFactory =
    Arc<dyn Fn(&ValidationConfig) -> JwtResult<Arc<dyn ClaimValidator>> + Send + Sync>;

// =============================================================================
// Registry
// =============================================================================

/// Lookup table from validator identifier to factory.
#[derive(Clone)]
pub struct ValidatorRegistry {
    factories: HashMap<String, ValidatorFactory>,
}

impl ValidatorRegistry {
    /// Identifier of [`ExpirationValidator`].
    pub const EXPIRATION: &'static str = "expiration";
    /// Identifier of [`NotBeforeValidator`].
    pub const NOT_BEFORE: &'static str = "not_before";
    /// Identifier of [`IssuedAtValidator`].
    pub const ISSUED_AT: &'static str = "issued_at";

    /// Creates a registry with the built-in validators.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::EXPIRATION, |config: &ValidationConfig| {
            Ok(Arc::new(ExpirationValidator::new(config)) as Arc<dyn ClaimValidator>)
        });
        registry.register(Self::NOT_BEFORE, |config: &ValidationConfig| {
            Ok(Arc::new(NotBeforeValidator::new(config)) as Arc<dyn ClaimValidator>)
        });
        registry.register(Self::ISSUED_AT, |config: &ValidationConfig| {
            Ok(Arc::new(IssuedAtValidator::new(config)) as Arc<dyn ClaimValidator>)
        });
        registry
    }

    /// Creates a registry with no validators.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers (or replaces) a validator.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&ValidationConfig) -> JwtResult<Arc<dyn ClaimValidator>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
    }

    /// Returns `true` if a validator with this identifier is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    fn factory(&self, id: &str) -> JwtResult<&ValidatorFactory> {
        self.factories
            .get(id)
            .ok_or_else(|| JwtError::configuration(format!("unknown validator '{id}'")))
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Ordered list of validators applied to every decoded claim set.
///
/// Instances are created on first use and reused afterwards. Concurrent
/// first use of the same identifier builds a single instance.
pub struct ValidationPipeline {
    identifiers: Vec<String>,
    registry: ValidatorRegistry,
    config: ValidationConfig,
    instances: DashMap<String, Arc<dyn ClaimValidator>>,
}

impl ValidationPipeline {
    /// Creates a pipeline running `identifiers` in order.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] if an identifier is not registered.
    pub fn new<I, S>(
        identifiers: I,
        registry: ValidatorRegistry,
        config: ValidationConfig,
    ) -> JwtResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
        for id in &identifiers {
            registry.factory(id)?;
        }
        Ok(Self {
            identifiers,
            registry,
            config,
            instances: DashMap::new(),
        })
    }

    /// A pipeline with the default validators and no leeway.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            identifiers: vec![
                ValidatorRegistry::EXPIRATION.to_string(),
                ValidatorRegistry::NOT_BEFORE.to_string(),
            ],
            registry: ValidatorRegistry::new(),
            config: ValidationConfig::default(),
            instances: DashMap::new(),
        }
    }

    /// Configured identifiers, in run order.
    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Settings passed to validator factories.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Returns the memoized validator for `id`, building it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] for an unknown identifier, or
    /// whatever the factory reports.
    pub fn validator(&self, id: &str) -> JwtResult<Arc<dyn ClaimValidator>> {
        if let Some(existing) = self.instances.get(id) {
            return Ok(Arc::clone(existing.value()));
        }
        let factory = self.registry.factory(id)?;
        let entry = self
            .instances
            .entry(id.to_string())
            .or_try_insert_with(|| {
                tracing::debug!(validator = %id, "creating claim validator");
                factory(&self.config)
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Applies every validator in order and returns the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first validator's rejection.
    pub fn run(&self, claims: &ClaimSet, now: i64) -> JwtResult<()> {
        for id in &self.identifiers {
            let validator = self.validator(id)?;
            if let Err(err) = validator.validate(claims, now) {
                tracing::debug!(validator = %id, reason = %err, "claim validation failed");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("identifiers", &self.identifiers)
            .field("config", &self.config)
            .field("built", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: i64 = 1_700_000_000;

    struct RequireSubject;

    impl ClaimValidator for RequireSubject {
        fn validate(&self, claims: &ClaimSet, _now: i64) -> JwtResult<()> {
            if claims.subject().is_none() {
                return Err(JwtError::invalid("sub is required"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_unknown_identifier_fails_fast() {
        let result = ValidationPipeline::new(
            ["expiration", "audience"],
            ValidatorRegistry::new(),
            ValidationConfig::default(),
        );
        let err = result.err().unwrap();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("audience"));
    }

    #[test]
    fn test_standard_pipeline() {
        let pipeline = ValidationPipeline::standard();
        assert_eq!(pipeline.identifiers(), ["expiration", "not_before"]);

        let fresh = ClaimSet::new().with("exp", NOW + 60).with("nbf", NOW);
        assert!(pipeline.run(&fresh, NOW).is_ok());

        let expired = ClaimSet::new().with("exp", NOW - 60);
        assert!(matches!(
            pipeline.run(&expired, NOW),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_first_failure_wins() {
        // Expired and not yet valid at the same time; order decides.
        let claims = ClaimSet::new().with("exp", NOW - 10).with("nbf", NOW + 10);

        let exp_first = ValidationPipeline::new(
            ["expiration", "not_before"],
            ValidatorRegistry::new(),
            ValidationConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            exp_first.run(&claims, NOW),
            Err(JwtError::TokenExpired)
        ));

        let nbf_first = ValidationPipeline::new(
            ["not_before", "expiration"],
            ValidatorRegistry::new(),
            ValidationConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            nbf_first.run(&claims, NOW),
            Err(JwtError::TokenNotYetValid { .. })
        ));
    }

    #[test]
    fn test_empty_pipeline_accepts_everything() {
        let pipeline = ValidationPipeline::new(
            Vec::<String>::new(),
            ValidatorRegistry::new(),
            ValidationConfig::default(),
        )
        .unwrap();
        let claims = ClaimSet::new().with("exp", 0);
        assert!(pipeline.run(&claims, NOW).is_ok());
    }

    #[test]
    fn test_leeway_reaches_validators() {
        let pipeline = ValidationPipeline::new(
            ["expiration"],
            ValidatorRegistry::new(),
            ValidationConfig::default().with_leeway(120),
        )
        .unwrap();
        let claims = ClaimSet::new().with("exp", NOW - 60);
        assert!(pipeline.run(&claims, NOW).is_ok());
    }

    #[test]
    fn test_custom_validator() {
        let mut registry = ValidatorRegistry::new();
        registry.register("subject", |_config: &ValidationConfig| {
            Ok(Arc::new(RequireSubject) as Arc<dyn ClaimValidator>)
        });
        assert!(registry.contains("subject"));

        let pipeline =
            ValidationPipeline::new(["subject"], registry, ValidationConfig::default()).unwrap();
        assert!(pipeline.run(&ClaimSet::new().with("sub", "1"), NOW).is_ok());
        assert!(matches!(
            pipeline.run(&ClaimSet::new(), NOW),
            Err(JwtError::TokenInvalid { .. })
        ));
    }

    #[test]
    fn test_validators_are_memoized() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut registry = ValidatorRegistry::empty();
        registry.register("counted", move |config: &ValidationConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ExpirationValidator::new(config)) as Arc<dyn ClaimValidator>)
        });

        let pipeline =
            ValidationPipeline::new(["counted"], registry, ValidationConfig::default()).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 0);

        for _ in 0..5 {
            pipeline.run(&ClaimSet::new(), NOW).unwrap();
        }
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut registry = ValidatorRegistry::empty();
        registry.register("counted", move |config: &ValidationConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NotBeforeValidator::new(config)) as Arc<dyn ClaimValidator>)
        });
        let pipeline = Arc::new(
            ValidationPipeline::new(["counted"], registry, ValidationConfig::default()).unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                std::thread::spawn(move || pipeline.run(&ClaimSet::new(), NOW).is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_error_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut registry = ValidatorRegistry::empty();
        registry.register("flaky", move |_config: &ValidationConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(JwtError::configuration("flaky validator"))
        });
        let pipeline =
            ValidationPipeline::new(["flaky"], registry, ValidationConfig::default()).unwrap();

        assert!(pipeline.run(&ClaimSet::new(), NOW).is_err());
        assert!(pipeline.run(&ClaimSet::new(), NOW).is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
