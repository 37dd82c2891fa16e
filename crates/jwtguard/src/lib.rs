//! # jwtguard
//!
//! JSON Web Token lifecycle management.
//!
//! This crate provides:
//! - Token signing and verification for HS, RS and ES at 256/384/512 bits
//! - A configurable claim validation pipeline with clock-skew leeway
//! - Refresh with a configurable set of persistent claims
//! - Revocation through a `jti` blacklist over pluggable storage
//!
//! ## Modules
//!
//! - [`claims`] - Claim sets and registered claim names
//! - [`provider`] - Signing providers and the driver registry
//! - [`validation`] - Claim validators, their registry and the pipeline
//! - [`storage`] - Revocation storage contract and the blacklist
//! - [`manager`] - The token lifecycle manager
//! - [`config`] - Manager configuration
//! - [`error`] - Error taxonomy
//!
//! Cache-backed [`Storage`] implementations live in `jwtguard-cache`.

pub mod claims;
pub mod config;
pub mod error;
pub mod manager;
pub mod provider;
pub mod storage;
pub mod validation;

pub use claims::{ClaimSet, ClaimValue};
pub use config::{ConfigError, JwtConfig};
pub use error::{ErrorCategory, JwtError};
pub use manager::{DecodeOptions, JwtManager, JwtManagerBuilder, Registries};
pub use provider::{
    JwtProvider, KeyBundle, ProviderRegistry, SignerConfig, SigningAlgorithm, SigningProvider,
};
pub use storage::{Blacklist, Storage, StorageRegistry};
pub use validation::{
    ClaimValidator, Clock, FixedClock, SystemClock, ValidationConfig, ValidationPipeline,
    ValidatorRegistry,
};

/// Type alias for token lifecycle results.
pub type JwtResult<T> = Result<T, JwtError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use jwtguard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::JwtResult;
    pub use crate::claims::{ClaimSet, ClaimValue, registered};
    pub use crate::config::{ConfigError, JwtConfig};
    pub use crate::error::{ErrorCategory, JwtError};
    pub use crate::manager::{DecodeOptions, JwtManager, Registries};
    pub use crate::provider::{KeyBundle, SignerConfig, SigningAlgorithm, SigningProvider};
    pub use crate::storage::{Blacklist, Storage, StorageRegistry};
    pub use crate::validation::{ClaimValidator, Clock, ValidationConfig, ValidatorRegistry};
}
