//! Error types for token lifecycle operations.
//!
//! Every failure surfaced by the crate is a [`JwtError`]. The variants keep
//! "bad token" (malformed, bad signature) apart from "good token that is no
//! longer acceptable" (expired, not yet valid, revoked) so callers can pick a
//! different reaction for each.

use std::fmt;

/// Errors that can occur while encoding, decoding, validating or revoking tokens.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Setup problem: unknown algorithm, driver or validator, missing key material.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The token string could not be parsed.
    #[error("Malformed token: {message}")]
    TokenMalformed {
        /// Description of the parse failure.
        message: String,
    },

    /// The token parsed but failed signature or structural verification.
    #[error("Invalid token: {message}")]
    TokenInvalid {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token is not valid yet (`nbf` or `iat` lies in the future).
    #[error("Token not yet valid: {message}")]
    TokenNotYetValid {
        /// Which claim rejected the token.
        message: String,
    },

    /// The token has been blacklisted.
    #[error("Token revoked")]
    TokenRevoked,

    /// An operation that needs the blacklist was called while it is disabled.
    #[error("Token blacklist is not enabled")]
    RevocationDisabled,

    /// Signing failed for an otherwise valid claim set.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// The revocation store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `TokenMalformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::TokenMalformed {
            message: message.into(),
        }
    }

    /// Creates a new `TokenInvalid` error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::TokenInvalid {
            message: message.into(),
        }
    }

    /// Creates a new `TokenNotYetValid` error.
    #[must_use]
    pub fn not_yet_valid(message: impl Into<String>) -> Self {
        Self::TokenNotYetValid {
            message: message.into(),
        }
    }

    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns `true` if the token itself was rejected.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::TokenMalformed { .. }
                | Self::TokenInvalid { .. }
                | Self::TokenExpired
                | Self::TokenNotYetValid { .. }
                | Self::TokenRevoked
        )
    }

    /// Returns `true` if the token was well-formed and signed but is
    /// no longer (or not yet) acceptable.
    ///
    /// Callers typically answer these with a re-authentication prompt
    /// instead of a flat rejection.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::TokenExpired | Self::TokenNotYetValid { .. } | Self::TokenRevoked
        )
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::TokenMalformed { .. } | Self::TokenInvalid { .. } => ErrorCategory::Token,
            Self::TokenExpired | Self::TokenNotYetValid { .. } | Self::TokenRevoked => {
                ErrorCategory::Validation
            }
            Self::RevocationDisabled => ErrorCategory::Usage,
            Self::Encoding { .. } => ErrorCategory::Internal,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Maps a `jsonwebtoken` failure onto the crate taxonomy.
///
/// Decoding and encoding share the mapping for key errors; everything the
/// signer itself reports while encoding is turned into [`JwtError::Encoding`]
/// by the caller.
impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                Self::invalid(err.to_string())
            }
            ErrorKind::InvalidToken
            | ErrorKind::MissingAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::malformed(err.to_string()),
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => Self::configuration(err.to_string()),
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::ImmatureSignature => Self::not_yet_valid(err.to_string()),
            _ => Self::invalid(err.to_string()),
        }
    }
}

/// Categories of token errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Setup errors, never retried.
    Configuration,
    /// Malformed or badly signed tokens.
    Token,
    /// Expired, premature or revoked tokens.
    Validation,
    /// API misuse by the caller.
    Usage,
    /// Revocation store failures.
    Infrastructure,
    /// Unexpected internal failures.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Usage => write!(f, "usage"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
