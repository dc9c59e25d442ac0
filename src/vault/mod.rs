//! Vault module: encrypted secret storage behind a passphrase.
//!
//! This module provides:
//! - `EncryptedSecretRecord` and `VaultConfig` types (`record`)
//! - The high-level `Vault` for passphrase lifecycle and secret CRUD
//!   (`vault`)

pub mod record;
pub mod vault;

// Re-export the most commonly used items.
pub use record::{EncryptedSecretRecord, VaultConfig};
pub use vault::{Vault, MIN_PASSPHRASE_LEN};
