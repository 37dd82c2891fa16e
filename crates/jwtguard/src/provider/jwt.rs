//! Signing provider backed by the `jsonwebtoken` crate.
//!
//! HMAC, RSA, ES256 and ES384 go through `jsonwebtoken`. It has no P-521
//! implementation, so ES512 signs and verifies with the `p521` crate using
//! the same compact serialization.
//!
//! ## Example
//!
//! ```ignore
//! use jwtguard::provider::{JwtProvider, SignerConfig, SigningProvider};
//!
//! let provider = JwtProvider::new(&SignerConfig::new("HS256").with_secret("test-secret"))?;
//! let token = provider.encode(&claims)?;
//! let decoded = provider.decode(&token)?;
//! ```

use std::sync::OnceLock;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use p521::ecdsa::signature::{Signer, Verifier};
use p521::elliptic_curve::sec1::ToEncodedPoint;
use p521::pkcs8::{DecodePrivateKey, DecodePublicKey};

use super::algorithm::{AlgorithmFamily, SigningAlgorithm};
use super::compact::{CompactToken, TokenHeader, decode_segment, encode_segment};
use super::keys::KeyBundle;
use super::{SignerConfig, SigningProvider};
use crate::JwtResult;
use crate::claims::ClaimSet;
use crate::error::JwtError;

/// Resolved signing key.
enum SigningKey {
    Jwt(Algorithm, EncodingKey),
    P521(p521::ecdsa::SigningKey),
}

/// Resolved verification key.
enum VerifyingKey {
    Jwt(Algorithm, DecodingKey),
    P521(p521::ecdsa::VerifyingKey),
}

/// Signing provider for the nine supported algorithms.
///
/// Keys are resolved on first use and cached, so a provider for an
/// asymmetric algorithm can be built with only a public key and used for
/// verification alone.
pub struct JwtProvider {
    algorithm: SigningAlgorithm,
    secret: Option<String>,
    keys: KeyBundle,
    signing_key: OnceLock<SigningKey>,
    verifying_key: OnceLock<VerifyingKey>,
}

impl JwtProvider {
    /// Creates a provider from signer settings.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] if the algorithm name is not one
    /// of the supported algorithms. Missing key material is reported on
    /// first use instead.
    pub fn new(config: &SignerConfig) -> JwtResult<Self> {
        let algorithm = config.algorithm.parse()?;
        Ok(Self {
            algorithm,
            secret: config.secret.clone(),
            keys: config.keys.clone(),
            signing_key: OnceLock::new(),
            verifying_key: OnceLock::new(),
        })
    }

    fn signing_key(&self) -> JwtResult<&SigningKey> {
        if let Some(key) = self.signing_key.get() {
            return Ok(key);
        }
        let key = self.resolve_signing_key()?;
        Ok(self.signing_key.get_or_init(|| key))
    }

    fn verifying_key(&self) -> JwtResult<&VerifyingKey> {
        if let Some(key) = self.verifying_key.get() {
            return Ok(key);
        }
        let key = self.resolve_verifying_key()?;
        Ok(self.verifying_key.get_or_init(|| key))
    }

    fn shared_secret(&self) -> JwtResult<&[u8]> {
        match self.secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret.as_bytes()),
            _ => Err(JwtError::configuration(format!(
                "a secret is required for {}",
                self.algorithm
            ))),
        }
    }

    fn resolve_signing_key(&self) -> JwtResult<SigningKey> {
        let Some(alg) = self.algorithm.to_jwt_algorithm() else {
            let pem = self.keys.private_pem()?;
            let secret = p521::SecretKey::from_pkcs8_pem(&pem)
                .map_err(|e| JwtError::configuration(format!("invalid P-521 private key: {e}")))?;
            let key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
                .map_err(|e| JwtError::configuration(format!("invalid P-521 private key: {e}")))?;
            return Ok(SigningKey::P521(key));
        };

        let key = match self.algorithm.family() {
            AlgorithmFamily::Hmac => EncodingKey::from_secret(self.shared_secret()?),
            AlgorithmFamily::Rsa => EncodingKey::from_rsa_pem(self.keys.private_pem()?.as_bytes())
                .map_err(|e| JwtError::configuration(format!("invalid RSA private key: {e}")))?,
            AlgorithmFamily::Ecdsa => EncodingKey::from_ec_pem(self.keys.private_pem()?.as_bytes())
                .map_err(|e| JwtError::configuration(format!("invalid EC private key: {e}")))?,
        };
        Ok(SigningKey::Jwt(alg, key))
    }

    fn resolve_verifying_key(&self) -> JwtResult<VerifyingKey> {
        let Some(alg) = self.algorithm.to_jwt_algorithm() else {
            let public = p521::PublicKey::from_public_key_pem(self.keys.public_pem()?)
                .map_err(|e| JwtError::configuration(format!("invalid P-521 public key: {e}")))?;
            let key =
                p521::ecdsa::VerifyingKey::from_sec1_bytes(public.to_encoded_point(false).as_bytes())
                    .map_err(|e| {
                        JwtError::configuration(format!("invalid P-521 public key: {e}"))
                    })?;
            return Ok(VerifyingKey::P521(key));
        };

        let key = match self.algorithm.family() {
            AlgorithmFamily::Hmac => DecodingKey::from_secret(self.shared_secret()?),
            AlgorithmFamily::Rsa => DecodingKey::from_rsa_pem(self.keys.public_pem()?.as_bytes())
                .map_err(|e| JwtError::configuration(format!("invalid RSA public key: {e}")))?,
            AlgorithmFamily::Ecdsa => DecodingKey::from_ec_pem(self.keys.public_pem()?.as_bytes())
                .map_err(|e| JwtError::configuration(format!("invalid EC public key: {e}")))?,
        };
        Ok(VerifyingKey::Jwt(alg, key))
    }

    /// Builds a validation that only checks the signature; temporal claims
    /// are the pipeline's job.
    fn signature_only_validation(alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl SigningProvider for JwtProvider {
    fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    fn encode(&self, claims: &ClaimSet) -> JwtResult<String> {
        claims.check_registered()?;

        match self.signing_key()? {
            SigningKey::Jwt(alg, key) => jsonwebtoken::encode(&Header::new(*alg), claims, key)
                .map_err(|e| JwtError::encoding(e.to_string())),
            SigningKey::P521(key) => {
                let header = serde_json::to_vec(&TokenHeader::jwt(self.algorithm.as_str()))
                    .map_err(|e| JwtError::encoding(e.to_string()))?;
                let payload =
                    serde_json::to_vec(claims).map_err(|e| JwtError::encoding(e.to_string()))?;
                let signing_input =
                    format!("{}.{}", encode_segment(&header), encode_segment(&payload));

                let signature: p521::ecdsa::Signature = key
                    .try_sign(signing_input.as_bytes())
                    .map_err(|e| JwtError::encoding(e.to_string()))?;

                Ok(format!(
                    "{signing_input}.{}",
                    encode_segment(&signature.to_bytes())
                ))
            }
        }
    }

    fn decode(&self, token: &str) -> JwtResult<ClaimSet> {
        let compact = CompactToken::split(token)?;
        let header = compact.header()?;
        if header.alg != self.algorithm.as_str() {
            return Err(JwtError::invalid(format!(
                "token algorithm '{}' does not match configured '{}'",
                header.alg, self.algorithm
            )));
        }

        let mut claims = match self.verifying_key()? {
            VerifyingKey::Jwt(alg, key) => {
                let validation = Self::signature_only_validation(*alg);
                jsonwebtoken::decode::<ClaimSet>(token, key, &validation)?.claims
            }
            VerifyingKey::P521(key) => {
                let signature_bytes = decode_segment(compact.signature, "signature")?;
                let signature = p521::ecdsa::Signature::from_slice(&signature_bytes)
                    .map_err(|_| JwtError::invalid("signature has the wrong length"))?;
                key.verify(compact.signing_input.as_bytes(), &signature)
                    .map_err(|_| JwtError::invalid("signature verification failed"))?;

                let payload = decode_segment(compact.payload, "payload")?;
                serde_json::from_slice::<ClaimSet>(&payload)
                    .map_err(|e| JwtError::malformed(format!("invalid payload JSON: {e}")))?
            }
        };

        claims.normalize_timestamps();
        claims.check_timestamps()?;
        Ok(claims)
    }
}
