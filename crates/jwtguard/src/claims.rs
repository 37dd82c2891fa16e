//! Claim sets carried in token payloads.
//!
//! A [`ClaimSet`] is an insertion-ordered map from claim name to
//! [`ClaimValue`]. The seven registered claims from RFC 7519 have typed
//! accessors; everything else is a custom claim and passes through untouched.
//!
//! ```ignore
//! use jwtguard::claims::{ClaimSet, registered};
//!
//! let claims = ClaimSet::new()
//!     .with(registered::SUBJECT, "user-1")
//!     .with(registered::ISSUED_AT, 1_700_000_000)
//!     .with("role", "admin");
//!
//! assert_eq!(claims.subject(), Some("user-1"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::JwtResult;
use crate::error::JwtError;

/// Registered claim names (RFC 7519 section 4.1).
pub mod registered {
    /// `iss` (Issuer).
    pub const ISSUER: &str = "iss";
    /// `sub` (Subject).
    pub const SUBJECT: &str = "sub";
    /// `aud` (Audience), a single string or a list.
    pub const AUDIENCE: &str = "aud";
    /// `exp` (Expiration Time), Unix seconds.
    pub const EXPIRATION: &str = "exp";
    /// `nbf` (Not Before), Unix seconds.
    pub const NOT_BEFORE: &str = "nbf";
    /// `iat` (Issued At), Unix seconds.
    pub const ISSUED_AT: &str = "iat";
    /// `jti` (JWT ID), used as the blacklist key.
    pub const JWT_ID: &str = "jti";

    /// All registered claim names.
    pub const ALL: [&str; 7] = [
        ISSUER, SUBJECT, AUDIENCE, EXPIRATION, NOT_BEFORE, ISSUED_AT, JWT_ID,
    ];

    /// Claims holding Unix timestamps.
    pub const TIMESTAMPS: [&str; 3] = [EXPIRATION, NOT_BEFORE, ISSUED_AT];
}

// ============================================================================
// Claim Value
// ============================================================================

/// The value of a single claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// Integer value; timestamps use this variant.
    Integer(i64),
    /// String value.
    String(String),
    /// List of strings (e.g. a multi-valued `aud`).
    List(Vec<String>),
    /// Any other JSON value a custom claim may carry.
    Other(serde_json::Value),
}

impl ClaimValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the list value, if this is a list of strings.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Coerces a numeric JSON value into an integer timestamp.
    ///
    /// Fractional seconds are truncated. Returns `None` for non-numeric values.
    fn to_timestamp(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Other(serde_json::Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            _ => None,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ClaimValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        Self::Other(serde_json::Value::Bool(value))
    }
}

impl From<Vec<String>> for ClaimValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for ClaimValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<serde_json::Value> for ClaimValue {
    fn from(value: serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(Self::Other(value))
    }
}

// ============================================================================
// Claim Set
// ============================================================================

/// Ordered mapping from claim name to value.
///
/// Serializes as a flat JSON object, which is exactly the token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet {
    claims: IndexMap<String, ClaimValue>,
}

impl ClaimSet {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a claim, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a claim, returning the previous value.
    ///
    /// Replacing an existing claim keeps its position.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ClaimValue>,
    ) -> Option<ClaimValue> {
        self.claims.insert(name.into(), value.into())
    }

    /// Returns the value of a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }

    /// Removes a claim, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<ClaimValue> {
        self.claims.shift_remove(name)
    }

    /// Returns `true` if the claim is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns `true` if there are no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Iterates over claims in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.claims.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Claim names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.claims.keys().map(String::as_str)
    }

    /// Builds a new claim set holding only the named claims that are present.
    ///
    /// Order follows `names`.
    #[must_use]
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Self {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.claims
                    .get(name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.get(registered::ISSUER).and_then(ClaimValue::as_str)
    }

    /// `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get(registered::SUBJECT).and_then(ClaimValue::as_str)
    }

    /// `aud` claim, flattened to a list whether it was a single value or many.
    #[must_use]
    pub fn audience(&self) -> Vec<&str> {
        match self.get(registered::AUDIENCE) {
            Some(ClaimValue::String(aud)) => vec![aud.as_str()],
            Some(ClaimValue::List(auds)) => auds.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// `exp` claim.
    #[must_use]
    pub fn expiration(&self) -> Option<i64> {
        self.get(registered::EXPIRATION).and_then(ClaimValue::as_i64)
    }

    /// `nbf` claim.
    #[must_use]
    pub fn not_before(&self) -> Option<i64> {
        self.get(registered::NOT_BEFORE).and_then(ClaimValue::as_i64)
    }

    /// `iat` claim.
    #[must_use]
    pub fn issued_at(&self) -> Option<i64> {
        self.get(registered::ISSUED_AT).and_then(ClaimValue::as_i64)
    }

    /// `jti` claim.
    #[must_use]
    pub fn jwt_id(&self) -> Option<&str> {
        self.get(registered::JWT_ID).and_then(ClaimValue::as_str)
    }

    /// Checks that registered claims hold values of the right shape.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Encoding`] naming the first offending claim.
    pub(crate) fn check_registered(&self) -> JwtResult<()> {
        for (name, value) in &self.claims {
            let ok = match name.as_str() {
                registered::EXPIRATION | registered::NOT_BEFORE | registered::ISSUED_AT => {
                    matches!(value, ClaimValue::Integer(_))
                }
                registered::AUDIENCE => {
                    matches!(value, ClaimValue::String(_) | ClaimValue::List(_))
                }
                registered::ISSUER | registered::SUBJECT | registered::JWT_ID => {
                    matches!(value, ClaimValue::String(_))
                }
                _ => true,
            };
            if !ok {
                return Err(JwtError::encoding(format!(
                    "unsupported value for registered claim '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Rewrites numeric time claims as plain integer seconds.
    pub(crate) fn normalize_timestamps(&mut self) {
        for name in registered::TIMESTAMPS {
            if let Some(value) = self.claims.get_mut(name) {
                if let Some(ts) = value.to_timestamp() {
                    *value = ClaimValue::Integer(ts);
                }
            }
        }
    }

    /// Checks that every present time claim is integer seconds.
    ///
    /// Run after [`normalize_timestamps`](Self::normalize_timestamps), so
    /// numeric values have already been folded into integers.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::TokenMalformed`] naming the first offending claim.
    pub(crate) fn check_timestamps(&self) -> JwtResult<()> {
        for name in registered::TIMESTAMPS {
            match self.claims.get(name) {
                None | Some(ClaimValue::Integer(_)) => {}
                Some(_) => {
                    return Err(JwtError::malformed(format!(
                        "claim '{name}' must be a numeric timestamp"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            claims: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for ClaimSet {
    type Item = (String, ClaimValue);
    type IntoIter = indexmap::map::IntoIter<String, ClaimValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_accessors() {
        let claims = ClaimSet::new()
            .with("iss", "https://issuer.example.com")
            .with("sub", "user-1")
            .with("aud", vec!["api", "admin"])
            .with("exp", 1_700_003_600)
            .with("nbf", 1_700_000_000)
            .with("iat", 1_700_000_000)
            .with("jti", "abc");

        assert_eq!(claims.issuer(), Some("https://issuer.example.com"));
        assert_eq!(claims.subject(), Some("user-1"));
        assert_eq!(claims.audience(), vec!["api", "admin"]);
        assert_eq!(claims.expiration(), Some(1_700_003_600));
        assert_eq!(claims.not_before(), Some(1_700_000_000));
        assert_eq!(claims.issued_at(), Some(1_700_000_000));
        assert_eq!(claims.jwt_id(), Some("abc"));
    }

    #[test]
    fn test_single_audience_flattens() {
        let claims = ClaimSet::new().with("aud", "api");
        assert_eq!(claims.audience(), vec!["api"]);
        assert!(ClaimSet::new().audience().is_empty());
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let claims = ClaimSet::new()
            .with("sub", "user-1")
            .with("iat", 1_700_000_000)
            .with("role", "admin");

        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(json, r#"{"sub":"user-1","iat":1700000000,"role":"admin"}"#);
    }

    #[test]
    fn test_deserializes_mixed_values() {
        let claims: ClaimSet = serde_json::from_str(
            r#"{"sub":"u","exp":10,"aud":["a","b"],"meta":{"k":true},"admin":false}"#,
        )
        .unwrap();

        assert_eq!(claims.get("sub"), Some(&ClaimValue::String("u".into())));
        assert_eq!(claims.get("exp"), Some(&ClaimValue::Integer(10)));
        assert_eq!(
            claims.get("aud"),
            Some(&ClaimValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            claims.get("admin"),
            Some(&ClaimValue::Other(serde_json::Value::Bool(false)))
        );
        assert!(matches!(claims.get("meta"), Some(ClaimValue::Other(_))));
    }

    #[test]
    fn test_normalize_fractional_timestamps() {
        let mut claims: ClaimSet =
            serde_json::from_str(r#"{"exp":1700003600.75,"iat":1700000000}"#).unwrap();
        assert!(matches!(claims.get("exp"), Some(ClaimValue::Other(_))));

        claims.normalize_timestamps();
        assert_eq!(claims.expiration(), Some(1_700_003_600));
        assert_eq!(claims.issued_at(), Some(1_700_000_000));
    }

    #[test]
    fn test_check_timestamps_rejects_non_numeric() {
        for payload in [
            r#"{"exp":"1000"}"#,
            r#"{"exp":true}"#,
            r#"{"nbf":["1"]}"#,
            r#"{"iat":null}"#,
        ] {
            let mut claims: ClaimSet = serde_json::from_str(payload).unwrap();
            claims.normalize_timestamps();
            let err = claims.check_timestamps().unwrap_err();
            assert!(matches!(err, JwtError::TokenMalformed { .. }), "{payload}");
        }

        let mut claims: ClaimSet =
            serde_json::from_str(r#"{"sub":"u","exp":1700003600.5}"#).unwrap();
        claims.normalize_timestamps();
        assert!(claims.check_timestamps().is_ok());
        assert!(ClaimSet::new().with("sub", "u").check_timestamps().is_ok());
    }

    #[test]
    fn test_check_registered_rejects_bad_types() {
        let claims = ClaimSet::new().with("exp", "tomorrow");
        let err = claims.check_registered().unwrap_err();
        assert!(matches!(err, JwtError::Encoding { .. }));
        assert!(err.to_string().contains("exp"));

        let claims = ClaimSet::new().with("aud", 42);
        assert!(claims.check_registered().is_err());

        let claims = ClaimSet::new()
            .with("aud", "single")
            .with("custom", serde_json::json!({"nested": [1, 2]}));
        assert!(claims.check_registered().is_ok());
    }

    #[test]
    fn test_subset_keeps_requested_order() {
        let claims = ClaimSet::new()
            .with("a", 1)
            .with("b", 2)
            .with("c", 3);

        let subset = claims.subset(&["c", "missing", "a"]);
        let names: Vec<_> = subset.names().collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut claims = ClaimSet::new().with("jti", "old").with("sub", "u");
        let previous = claims.insert("jti", "new");

        assert_eq!(previous, Some(ClaimValue::String("old".into())));
        let names: Vec<_> = claims.names().collect();
        assert_eq!(names, vec!["jti", "sub"]);
        assert_eq!(claims.jwt_id(), Some("new"));
    }

    #[test]
    fn test_claim_value_from_json() {
        assert_eq!(
            ClaimValue::from(serde_json::json!("x")),
            ClaimValue::String("x".into())
        );
        assert_eq!(ClaimValue::from(serde_json::json!(5)), ClaimValue::Integer(5));
        assert_eq!(
            ClaimValue::from(serde_json::json!(null)),
            ClaimValue::Other(serde_json::Value::Null)
        );
    }
}
