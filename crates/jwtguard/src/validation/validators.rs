//! Built-in temporal claim validators.
//!
//! Each validator reads its settings from [`ValidationConfig`] once, at
//! construction, and passes claim sets that lack the claim it checks.

use super::{ClaimValidator, ValidationConfig};
use crate::JwtResult;
use crate::claims::ClaimSet;
use crate::error::JwtError;

fn leeway_of(config: &ValidationConfig) -> i64 {
    i64::try_from(config.leeway).unwrap_or(i64::MAX)
}

/// Rejects tokens whose `exp` lies in the past.
///
/// A token is expired once `now > exp + leeway`; at exactly `exp + leeway`
/// it is still accepted.
#[derive(Debug, Clone, Copy)]
pub struct ExpirationValidator {
    leeway: i64,
}

impl ExpirationValidator {
    /// Creates the validator from configuration.
    #[must_use]
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            leeway: leeway_of(config),
        }
    }
}

impl ClaimValidator for ExpirationValidator {
    fn validate(&self, claims: &ClaimSet, now: i64) -> JwtResult<()> {
        let Some(exp) = claims.expiration() else {
            return Ok(());
        };
        if now > exp.saturating_add(self.leeway) {
            return Err(JwtError::TokenExpired);
        }
        Ok(())
    }
}

/// Rejects tokens used before their `nbf`.
#[derive(Debug, Clone, Copy)]
pub struct NotBeforeValidator {
    leeway: i64,
}

impl NotBeforeValidator {
    /// Creates the validator from configuration.
    #[must_use]
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            leeway: leeway_of(config),
        }
    }
}

impl ClaimValidator for NotBeforeValidator {
    fn validate(&self, claims: &ClaimSet, now: i64) -> JwtResult<()> {
        let Some(nbf) = claims.not_before() else {
            return Ok(());
        };
        if now.saturating_add(self.leeway) < nbf {
            return Err(JwtError::not_yet_valid("nbf is in the future"));
        }
        Ok(())
    }
}

/// Rejects tokens whose `iat` claims they were issued in the future.
#[derive(Debug, Clone, Copy)]
pub struct IssuedAtValidator {
    leeway: i64,
}

impl IssuedAtValidator {
    /// Creates the validator from configuration.
    #[must_use]
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            leeway: leeway_of(config),
        }
    }
}

impl ClaimValidator for IssuedAtValidator {
    fn validate(&self, claims: &ClaimSet, now: i64) -> JwtResult<()> {
        let Some(iat) = claims.issued_at() else {
            return Ok(());
        };
        if now.saturating_add(self.leeway) < iat {
            return Err(JwtError::not_yet_valid("iat is in the future"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn with_leeway(leeway: u64) -> ValidationConfig {
        ValidationConfig::default().with_leeway(leeway)
    }

    #[test]
    fn test_missing_exp_passes() {
        let validator = ExpirationValidator::new(&with_leeway(0));
        let claims = ClaimSet::new().with("sub", "user-1");
        assert!(validator.validate(&claims, NOW).is_ok());
        assert!(validator.validate(&claims, i64::MAX).is_ok());
    }

    #[test]
    fn test_expired_without_leeway() {
        let validator = ExpirationValidator::new(&with_leeway(0));
        let claims = ClaimSet::new().with("exp", NOW - 1);
        assert!(matches!(
            validator.validate(&claims, NOW),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_exp_boundary_is_inclusive() {
        let validator = ExpirationValidator::new(&with_leeway(0));
        let claims = ClaimSet::new().with("exp", NOW);
        assert!(validator.validate(&claims, NOW).is_ok());
        assert!(validator.validate(&claims, NOW + 1).is_err());
    }

    #[test]
    fn test_leeway_absorbs_skew() {
        let validator = ExpirationValidator::new(&with_leeway(2));
        let claims = ClaimSet::new().with("exp", NOW - 1);

        // One second past expiry, still inside the two second window.
        assert!(validator.validate(&claims, NOW).is_ok());
        assert!(validator.validate(&claims, NOW + 1).is_ok());
        assert!(validator.validate(&claims, NOW + 2).is_err());
    }

    #[test]
    fn test_not_before() {
        let validator = NotBeforeValidator::new(&with_leeway(0));
        let claims = ClaimSet::new().with("nbf", NOW + 10);

        let err = validator.validate(&claims, NOW).unwrap_err();
        assert!(matches!(err, JwtError::TokenNotYetValid { .. }));
        assert!(validator.validate(&claims, NOW + 10).is_ok());

        let lenient = NotBeforeValidator::new(&with_leeway(10));
        assert!(lenient.validate(&claims, NOW).is_ok());
        assert!(validator.validate(&ClaimSet::new(), NOW).is_ok());
    }

    #[test]
    fn test_issued_in_future() {
        let validator = IssuedAtValidator::new(&with_leeway(5));
        assert!(
            validator
                .validate(&ClaimSet::new().with("iat", NOW + 5), NOW)
                .is_ok()
        );
        let err = validator
            .validate(&ClaimSet::new().with("iat", NOW + 6), NOW)
            .unwrap_err();
        assert!(err.to_string().contains("iat"));
    }

    #[test]
    fn test_huge_leeway_does_not_overflow() {
        let validator = ExpirationValidator::new(&with_leeway(u64::MAX));
        let claims = ClaimSet::new().with("exp", NOW);
        assert!(validator.validate(&claims, i64::MAX).is_ok());
    }
}
