//! Passphrase-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is fixed rather than configurable: lowering it
//! silently would weaken every vault, and raising it would make old
//! vaults un-openable.  The same passphrase + salt always derives the
//! same key, so "is this passphrase correct" is answered by a sentinel
//! decryption round-trip, never by comparing key bytes.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::Sha256;

use crate::errors::{CredVaultError, Result};

use super::keys::{DerivedKey, KEY_LEN};

/// Length of the key-derivation salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// PBKDF2 iteration count.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive a 256-bit AES key from a passphrase and salt.
///
/// The returned [`DerivedKey`] keeps its bytes private to this crate
/// and zeroizes them on drop.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<DerivedKey> {
    if salt.is_empty() {
        return Err(CredVaultError::KeyDerivationFailed(
            "salt must not be empty".into(),
        ));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);

    Ok(DerivedKey::new(key))
}

/// Generate a cryptographically random 16-byte salt.
///
/// A failing OS random source is a fatal configuration problem, not a
/// retryable condition, so it surfaces as `CryptoUnavailable`.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CredVaultError::CryptoUnavailable(format!("OS RNG failed: {e}")))?;
    Ok(salt)
}
