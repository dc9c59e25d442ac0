//! Persisted record types: one encrypted secret per provider, plus the
//! vault configuration.
//!
//! Binary fields (ciphertext, nonce, salt) use the base64 serde
//! helpers from `crypto::codec` so they serialize as strings in JSON
//! rather than raw byte arrays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::codec::{base64_decode, base64_encode};

/// One encrypted secret, keyed by provider id (e.g. "openai").
///
/// The nonce is stored alongside the ciphertext and is freshly
/// generated on every write, so it never repeats across records
/// written under the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedSecretRecord {
    /// Stable provider identifier, unique per vault.
    pub provider: String,

    /// The encrypted secret bytes (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,

    /// The 12-byte AES-GCM nonce used for this ciphertext.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// When this record was last written.
    pub created_at: DateTime<Utc>,
}

/// Vault configuration, persisted but not secret.
///
/// Its existence is what "a passphrase has been set" means; deleting
/// it (via `reset_all`) returns the vault to the uninitialized state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Salt for passphrase key derivation.  Generated at setup, fixed
    /// until passphrase rotation.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// Encryption of the fixed sentinel value under the derived key.
    /// Decrypting this verifies a candidate passphrase without ever
    /// touching a real secret.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub check_ciphertext: Vec<u8>,

    /// Nonce for the sentinel ciphertext.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub check_nonce: Vec<u8>,

    /// When the current passphrase was set.
    pub created_at: DateTime<Utc>,
}
