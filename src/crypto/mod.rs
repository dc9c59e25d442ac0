//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - PBKDF2-HMAC-SHA256 passphrase key derivation (`kdf`)
//! - The zeroizing `DerivedKey` handle (`keys`)
//! - Base64 byte/text codec helpers (`codec`)
//!
//! Everything here is a side-effect-free function over byte buffers
//! (random generation aside).  No layer above this one performs raw
//! key derivation or AEAD operations itself.

pub mod codec;
pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use credvault::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, generate_nonce, NONCE_LEN};
pub use kdf::{derive_key, generate_salt, SALT_LEN};
pub use keys::DerivedKey;
