//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! returns it alongside the ciphertext, because the record layer
//! persists ciphertext and nonce as separate fields.  `decrypt`
//! verifies the GCM auth tag and fails on any tampering; it never
//! returns garbage plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{CredVaultError, Result};

use super::keys::DerivedKey;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Generate a cryptographically random 12-byte nonce.
///
/// Freshness per call is what keeps nonces unique under a given key;
/// there is no sequence counter to get wrong.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CredVaultError::CryptoUnavailable(format!("OS RNG failed: {e}")))?;
    Ok(nonce)
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Returns `(ciphertext, nonce)`.  Two calls with identical inputs
/// produce different nonces and therefore different ciphertexts.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<(Vec<u8>, [u8; NONCE_LEN])> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CredVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce_bytes = generate_nonce()?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    Ok((ciphertext, nonce_bytes))
}

/// Decrypt data that was produced by `encrypt`.
///
/// Fails if the key, nonce, or ciphertext is wrong or has been
/// modified; GCM tag verification rejects tampered input.
pub fn decrypt(ciphertext: &[u8], nonce: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(CredVaultError::DecryptionFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CredVaultError::DecryptionFailed)?;

    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CredVaultError::DecryptionFailed)
}
