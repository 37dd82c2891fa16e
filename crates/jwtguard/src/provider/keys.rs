//! Key material for asymmetric algorithms.

use std::fmt;

use pkcs8::{EncryptedPrivateKeyInfo, LineEnding, SecretDocument};
use serde::{Deserialize, Serialize};

use crate::JwtResult;
use crate::error::JwtError;

const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// PEM key pair for RSA and ECDSA algorithms.
///
/// The private key signs, the public key verifies. An encrypted PKCS#8
/// private key is unlocked with `passphrase` the first time it is needed.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyBundle {
    /// PEM-encoded public key (SPKI).
    pub public: Option<String>,

    /// PEM-encoded private key (PKCS#8, optionally encrypted).
    pub private: Option<String>,

    /// Passphrase for an encrypted private key.
    pub passphrase: Option<String>,
}

impl KeyBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the public key.
    #[must_use]
    pub fn with_public(mut self, pem: impl Into<String>) -> Self {
        self.public = Some(pem.into());
        self
    }

    /// Sets the private key.
    #[must_use]
    pub fn with_private(mut self, pem: impl Into<String>) -> Self {
        self.private = Some(pem.into());
        self
    }

    /// Sets the private key passphrase.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Returns the public key PEM.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] if no public key is configured.
    pub(crate) fn public_pem(&self) -> JwtResult<&str> {
        self.public
            .as_deref()
            .ok_or_else(|| JwtError::configuration("public key is required for verification"))
    }

    /// Returns the private key as unencrypted PKCS#8 PEM.
    ///
    /// Plain keys are returned as-is; the passphrase only applies to
    /// `ENCRYPTED PRIVATE KEY` documents.
    ///
    /// # Errors
    ///
    /// Returns [`JwtError::Configuration`] if the key is missing, is not valid
    /// PEM, or cannot be decrypted with the passphrase.
    pub(crate) fn private_pem(&self) -> JwtResult<String> {
        let pem = self
            .private
            .as_deref()
            .ok_or_else(|| JwtError::configuration("private key is required for signing"))?;

        let (label, document) = SecretDocument::from_pem(pem)
            .map_err(|e| JwtError::configuration(format!("invalid private key PEM: {e}")))?;

        if label != ENCRYPTED_PRIVATE_KEY_LABEL {
            return Ok(pem.to_string());
        }

        let passphrase = self.passphrase.as_deref().ok_or_else(|| {
            JwtError::configuration("private key is encrypted but no passphrase is configured")
        })?;

        let info = EncryptedPrivateKeyInfo::try_from(document.as_bytes())
            .map_err(|e| JwtError::configuration(format!("invalid encrypted private key: {e}")))?;
        let decrypted = info
            .decrypt(passphrase)
            .map_err(|e| JwtError::configuration(format!("failed to decrypt private key: {e}")))?;
        let pem = decrypted
            .to_pem("PRIVATE KEY", LineEnding::LF)
            .map_err(|e| JwtError::configuration(format!("failed to re-encode private key: {e}")))?;

        Ok(pem.as_str().to_owned())
    }
}

impl fmt::Debug for KeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBundle")
            .field("public", &self.public.as_ref().map(|_| "<pem>"))
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
