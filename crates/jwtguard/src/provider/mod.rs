//! Signing providers: turn claim sets into signed tokens and back.
//!
//! - [`SigningProvider`] - the encode/decode contract
//! - [`JwtProvider`] - the built-in implementation for all nine algorithms
//! - [`ProviderRegistry`] - driver name to provider factory lookup

pub mod algorithm;
mod compact;
pub mod jwt;
pub mod keys;
pub mod registry;

pub use algorithm::{AlgorithmFamily, SigningAlgorithm};
pub use jwt::JwtProvider;
pub use keys::KeyBundle;
pub use registry::{ProviderFactory, ProviderRegistry};

use std::fmt;

use crate::JwtResult;
use crate::claims::ClaimSet;

/// Encodes claim sets into compact signed tokens and decodes them back.
///
/// Implementations verify signatures only; temporal checks belong to the
/// validation pipeline.
pub trait SigningProvider: Send + Sync {
    /// The algorithm this provider signs and verifies with.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Signs a claim set.
    ///
    /// # Errors
    ///
    /// - [`JwtError::Encoding`](crate::JwtError::Encoding) if signing fails or a
    ///   registered claim holds an unsupported value
    /// - [`JwtError::Configuration`](crate::JwtError::Configuration) if the
    ///   signing key is missing or unusable
    fn encode(&self, claims: &ClaimSet) -> JwtResult<String>;

    /// Parses a token and verifies its signature.
    ///
    /// # Errors
    ///
    /// - [`JwtError::TokenMalformed`](crate::JwtError::TokenMalformed) if the
    ///   string is not a well-formed token
    /// - [`JwtError::TokenInvalid`](crate::JwtError::TokenInvalid) if the
    ///   signature or algorithm does not match
    /// - [`JwtError::Configuration`](crate::JwtError::Configuration) if the
    ///   verification key is missing or unusable
    fn decode(&self, token: &str) -> JwtResult<ClaimSet>;
}

/// Settings a provider is built from.
#[derive(Clone, Default)]
pub struct SignerConfig {
    /// Algorithm name, e.g. `"HS256"`.
    pub algorithm: String,

    /// Shared secret for HMAC algorithms.
    pub secret: Option<String>,

    /// Key pair for RSA and ECDSA algorithms.
    pub keys: KeyBundle,
}

impl SignerConfig {
    /// Creates settings for the named algorithm with no key material.
    #[must_use]
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Self::default()
        }
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the key pair.
    #[must_use]
    pub fn with_keys(mut self, keys: KeyBundle) -> Self {
        self.keys = keys;
        self
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("algorithm", &self.algorithm)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("keys", &self.keys)
            .finish()
    }
}
