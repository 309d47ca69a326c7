//! Sealing secret values for the GitHub Actions secret endpoints.
//!
//! GitHub only accepts secrets encrypted as a libsodium sealed box under the
//! scope's current Curve25519 public key. The key is fetched fresh for every
//! scope; values sealed under a rotated key are rejected by GitHub.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::aead::OsRng;
use github_client::{PublicKey, SecretPayload};

use crate::errors::{StewardError, StewardResult};

#[cfg(test)]
#[path = "secret_sealer_tests.rs"]
mod tests;

/// A sealed value ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    /// Base64 encoded sealed box
    pub encrypted_value: String,
    /// Id of the key the value was sealed under
    pub key_id: String,
}

impl From<SealedSecret> for SecretPayload {
    fn from(sealed: SealedSecret) -> Self {
        SecretPayload {
            encrypted_value: sealed.encrypted_value,
            key_id: sealed.key_id,
        }
    }
}

/// Seals plaintext values under a GitHub public key.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSealer;

impl SecretSealer {
    /// Encrypts the UTF-8 `plaintext` as an anonymous sealed box.
    ///
    /// # Errors
    ///
    /// Returns `StewardError::Sealing` when the key is not valid base64 or not a
    /// 32 byte Curve25519 key.
    pub fn seal(public_key: &PublicKey, plaintext: &str) -> StewardResult<SealedSecret> {
        let key_bytes = STANDARD.decode(public_key.key.trim()).map_err(|e| {
            StewardError::Sealing(format!("public key {} is not base64: {}", public_key.key_id, e))
        })?;

        let key_bytes: [u8; crypto_box::KEY_SIZE] = key_bytes.try_into().map_err(|bytes: Vec<u8>| {
            StewardError::Sealing(format!(
                "public key {} has {} bytes, expected {}",
                public_key.key_id,
                bytes.len(),
                crypto_box::KEY_SIZE
            ))
        })?;

        let key = crypto_box::PublicKey::from(key_bytes);
        let sealed = key
            .seal(&mut OsRng, plaintext.as_bytes())
            .map_err(|e| StewardError::Sealing(e.to_string()))?;

        Ok(SealedSecret {
            encrypted_value: STANDARD.encode(sealed),
            key_id: public_key.key_id.clone(),
        })
    }
}
