//! Claim validation pipeline.
//!
//! Validators run after a token's signature has been verified. Each one
//! checks a single aspect of the claim set against the current time and
//! either passes or rejects with a specific [`JwtError`](crate::JwtError).
//!
//! Validators are looked up by name in a [`ValidatorRegistry`], so the
//! configured `validations` list is checked when the pipeline is built.

pub mod clock;
pub mod pipeline;
pub mod validators;

pub use clock::{Clock, FixedClock, SystemClock};
pub use pipeline::{ValidationPipeline, ValidatorFactory, ValidatorRegistry};
pub use validators::{ExpirationValidator, IssuedAtValidator, NotBeforeValidator};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::JwtResult;
use crate::claims::ClaimSet;

/// A single claim check.
pub trait ClaimValidator: Send + Sync {
    /// Checks `claims` at Unix time `now`.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason, typically
    /// [`JwtError::TokenExpired`](crate::JwtError::TokenExpired) or
    /// [`JwtError::TokenNotYetValid`](crate::JwtError::TokenNotYetValid).
    fn validate(&self, claims: &ClaimSet, now: i64) -> JwtResult<()>;
}

/// Settings handed to validator factories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Allowed clock skew in seconds.
    pub leeway: u64,

    /// Extra options for custom validators.
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl ValidationConfig {
    /// Sets the leeway in seconds.
    #[must_use]
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Adds a custom option.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Looks up a custom option.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options.get(name)
    }
}
