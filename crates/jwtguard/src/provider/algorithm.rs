//! The closed set of supported signing algorithms.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::error::JwtError;

/// Supported signing algorithms for JWT tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    RS512,
    /// ECDSA with P-256 and SHA-256.
    ES256,
    /// ECDSA with P-384 and SHA-384.
    ES384,
    /// ECDSA with P-521 and SHA-512.
    ES512,
}

/// Key family an algorithm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Shared-secret algorithms.
    Hmac,
    /// RSA key pairs.
    Rsa,
    /// Elliptic-curve key pairs.
    Ecdsa,
}

impl SigningAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 9] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
    ];

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
        }
    }

    /// Returns the key family of this algorithm.
    #[must_use]
    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Self::HS256 | Self::HS384 | Self::HS512 => AlgorithmFamily::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 => AlgorithmFamily::Rsa,
            Self::ES256 | Self::ES384 | Self::ES512 => AlgorithmFamily::Ecdsa,
        }
    }

    /// Returns `true` for shared-secret algorithms.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.family() == AlgorithmFamily::Hmac
    }

    /// Converts to the `jsonwebtoken` Algorithm type.
    ///
    /// `jsonwebtoken` has no P-521 support, so ES512 maps to `None`.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Option<Algorithm> {
        match self {
            Self::HS256 => Some(Algorithm::HS256),
            Self::HS384 => Some(Algorithm::HS384),
            Self::HS512 => Some(Algorithm::HS512),
            Self::RS256 => Some(Algorithm::RS256),
            Self::RS384 => Some(Algorithm::RS384),
            Self::RS512 => Some(Algorithm::RS512),
            Self::ES256 => Some(Algorithm::ES256),
            Self::ES384 => Some(Algorithm::ES384),
            Self::ES512 => None,
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str() == s)
            .ok_or_else(|| JwtError::configuration(format!("unsupported algorithm '{s}'")))
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names() {
        for alg in SigningAlgorithm::ALL {
            assert_eq!(alg.as_str().parse::<SigningAlgorithm>().unwrap(), alg);
        }
    }

    #[test]
    fn test_unknown_name_is_configuration_error() {
        let err = "XX999".parse::<SigningAlgorithm>().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("XX999"));

        // Names are case sensitive, like the header value.
        assert!("hs256".parse::<SigningAlgorithm>().is_err());
    }

    #[test]
    fn test_families() {
        assert!(SigningAlgorithm::HS384.is_symmetric());
        assert_eq!(SigningAlgorithm::RS512.family(), AlgorithmFamily::Rsa);
        assert_eq!(SigningAlgorithm::ES256.family(), AlgorithmFamily::Ecdsa);
        assert!(!SigningAlgorithm::ES512.is_symmetric());
    }

    #[test]
    fn test_jsonwebtoken_mapping() {
        assert_eq!(
            SigningAlgorithm::RS384.to_jwt_algorithm(),
            Some(Algorithm::RS384)
        );
        assert_eq!(SigningAlgorithm::ES512.to_jwt_algorithm(), None);
    }
}
