//! Compact JWS serialization helpers (`header.payload.signature`).

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::JwtResult;
use crate::error::JwtError;

/// The parts of the JOSE header this crate looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenHeader {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl TokenHeader {
    pub(crate) fn jwt(alg: &str) -> Self {
        Self {
            alg: alg.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// A token split into its three segments.
pub(crate) struct CompactToken<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
    /// `header.payload`, the bytes covered by the signature.
    pub signing_input: &'a str,
}

impl<'a> CompactToken<'a> {
    /// Splits a token into segments without decoding them.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::TokenMalformed`] unless there are exactly three
    /// non-empty header and payload segments.
    pub(crate) fn split(token: &'a str) -> JwtResult<Self> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(JwtError::malformed("token must have three segments"));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(JwtError::malformed("token has an empty segment"));
        }

        Ok(Self {
            header,
            payload,
            signature,
            signing_input: &token[..header.len() + 1 + payload.len()],
        })
    }

    /// Decodes and parses the header segment.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::TokenMalformed`] on bad base64 or JSON.
    pub(crate) fn header(&self) -> JwtResult<TokenHeader> {
        let bytes = decode_segment(self.header, "header")?;
        serde_json::from_slice(&bytes)
            .map_err(|e| JwtError::malformed(format!("invalid header JSON: {e}")))
    }
}

/// Base64url-encodes without padding.
pub(crate) fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Base64url-decodes a segment.
///
/// # Errors
///
/// Returns [`JwtError::TokenMalformed`] naming the segment.
pub(crate) fn decode_segment(segment: &str, what: &str) -> JwtResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JwtError::malformed(format!("invalid base64 in {what}: {e}")))
}
