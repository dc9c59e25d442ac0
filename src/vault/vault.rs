//! The secret vault: passphrase lifecycle plus secret CRUD.
//!
//! `Vault` is the only component that holds the derived key.  It wraps
//! a [`RecordStore`] and the crypto layer so callers work with simple
//! method calls like `vault.encrypt_secret("openai", "sk-...")`.
//!
//! A candidate passphrase is verified against a fixed sentinel value
//! encrypted at setup time, so a wrong passphrase is detected with a
//! single AEAD operation and never by attempting to decrypt a real
//! secret.

use chrono::Utc;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::{decrypt, derive_key, encrypt, generate_salt, DerivedKey};
use crate::errors::{CredVaultError, Result};
use crate::store::{RecordStore, WriteBatch};

use super::record::{EncryptedSecretRecord, VaultConfig};

/// Minimum passphrase length in characters.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Fixed, non-secret sentinel encrypted under the derived key at
/// passphrase setup.  Successful decryption of it proves a candidate
/// passphrase is correct.
const PASSPHRASE_CHECK: &[u8] = b"credvault-passphrase-check-v1";

/// The vault handle.  Create one over a store with [`Vault::new`]; it
/// starts locked.
pub struct Vault<S: RecordStore> {
    store: S,

    /// The derived key, held only between unlock and lock.  Dropping
    /// it zeroizes the backing bytes.
    key: Option<DerivedKey>,

    /// Reentrancy guard for passphrase rotation.
    rotating: bool,
}

impl<S: RecordStore> Vault<S> {
    /// Wrap a record store in a locked vault.
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: None,
            rotating: false,
        }
    }

    // ------------------------------------------------------------------
    // Passphrase lifecycle
    // ------------------------------------------------------------------

    /// Returns `true` iff a vault configuration exists in the store,
    /// i.e. a passphrase has been set.
    pub fn is_passphrase_set(&self) -> Result<bool> {
        Ok(self.store.load_config()?.is_some())
    }

    /// Returns `true` while a derived key is held in memory.
    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Set the initial passphrase and leave the vault unlocked.
    ///
    /// Fails with `AlreadyInitialized` if a configuration exists (use
    /// [`Vault::change_passphrase`] instead) and with
    /// `PassphraseTooShort` if the passphrase has fewer than 8
    /// characters.
    pub fn initialize_passphrase(&mut self, passphrase: &str) -> Result<()> {
        validate_passphrase(passphrase)?;

        if self.store.load_config()?.is_some() {
            return Err(CredVaultError::AlreadyInitialized);
        }

        let salt = generate_salt()?;
        let key = derive_key(passphrase, &salt)?;
        let (check_ciphertext, check_nonce) = encrypt(PASSPHRASE_CHECK, &key)?;

        let config = VaultConfig {
            salt: salt.to_vec(),
            check_ciphertext,
            check_nonce: check_nonce.to_vec(),
            created_at: Utc::now(),
        };

        self.store.commit(WriteBatch::new().set_config(config))?;
        self.key = Some(key);

        tracing::debug!("vault initialized and unlocked");
        Ok(())
    }

    /// Try to unlock with a candidate passphrase.
    ///
    /// Returns `Ok(false)` for an incorrect passphrase, including any
    /// AEAD tag mismatch while decrypting the sentinel.  That outcome
    /// is expected and recoverable, so it is not an error.  Fails with
    /// `NotInitialized` when no configuration exists.
    pub fn unlock(&mut self, passphrase: &str) -> Result<bool> {
        let config = self
            .store
            .load_config()?
            .ok_or(CredVaultError::NotInitialized)?;

        let key = derive_key(passphrase, &config.salt)?;

        match decrypt(&config.check_ciphertext, &config.check_nonce, &key) {
            Ok(mut sentinel) => {
                let ok: bool = sentinel.ct_eq(PASSPHRASE_CHECK).into();
                sentinel.zeroize();
                if ok {
                    self.key = Some(key);
                    tracing::debug!("vault unlocked");
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(CredVaultError::DecryptionFailed) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Discard the in-memory key.  Idempotent; always succeeds.
    pub fn lock(&mut self) {
        if self.key.take().is_some() {
            tracing::debug!("vault locked");
        }
    }

    /// Rotate the passphrase, re-encrypting every stored secret.
    ///
    /// Re-authenticates with `old_passphrase`, decrypts all records
    /// under the old key, then commits the new configuration and every
    /// re-encrypted record as a single atomic batch.  Either the whole
    /// vault ends up under the new key or nothing changes; no
    /// partial-rotation state is ever observable.
    pub fn change_passphrase(&mut self, old_passphrase: &str, new_passphrase: &str) -> Result<()> {
        // Validate before doing any expensive work.
        validate_passphrase(new_passphrase)?;

        if self.rotating {
            return Err(CredVaultError::RotationInProgress);
        }

        self.rotating = true;
        let result = self.rotate(old_passphrase, new_passphrase);
        self.rotating = false;
        result
    }

    fn rotate(&mut self, old_passphrase: &str, new_passphrase: &str) -> Result<()> {
        if !self.unlock(old_passphrase)? {
            return Err(CredVaultError::IncorrectPassphrase);
        }

        // Decrypt every secret under the old key.
        let providers = self.store.list_providers()?;
        let mut plaintexts: Vec<(String, Vec<u8>)> = Vec::with_capacity(providers.len());
        for provider in providers {
            let record = self
                .store
                .load_secret(&provider)?
                .ok_or_else(|| CredVaultError::Storage(format!("record vanished: {provider}")))?;
            let plaintext = self.decrypt_record(&record)?;
            plaintexts.push((provider, plaintext));
        }

        // Fresh salt, key, and sentinel for the new passphrase.
        let salt = generate_salt()?;
        let new_key = derive_key(new_passphrase, &salt)?;
        let (check_ciphertext, check_nonce) = encrypt(PASSPHRASE_CHECK, &new_key)?;

        let config = VaultConfig {
            salt: salt.to_vec(),
            check_ciphertext,
            check_nonce: check_nonce.to_vec(),
            created_at: Utc::now(),
        };

        // Re-encrypt everything under the new key into one batch.
        let mut batch = WriteBatch::new().set_config(config);
        let now = Utc::now();
        let mut encrypt_err: Option<CredVaultError> = None;
        for (provider, plaintext) in &plaintexts {
            match encrypt(plaintext, &new_key) {
                Ok((ciphertext, nonce)) => {
                    batch = batch.upsert(EncryptedSecretRecord {
                        provider: provider.clone(),
                        ciphertext,
                        nonce: nonce.to_vec(),
                        created_at: now,
                    });
                }
                Err(e) => {
                    encrypt_err = Some(e);
                    break;
                }
            }
        }

        // The decrypted values are no longer needed either way.
        for (_, plaintext) in plaintexts.iter_mut() {
            plaintext.zeroize();
        }
        if let Some(e) = encrypt_err {
            return Err(e);
        }

        self.store.commit(batch)?;
        self.key = Some(new_key);

        tracing::debug!("passphrase rotated");
        Ok(())
    }

    /// Lock the vault, then delete every secret record and the
    /// configuration in one atomic operation.  Irreversible; intended
    /// for forgot-passphrase recovery.
    pub fn reset_all(&mut self) -> Result<()> {
        self.lock();
        self.store
            .commit(WriteBatch::new().clear_config().clear_secrets())?;
        tracing::debug!("vault reset");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Encrypt and upsert a secret for `provider`.
    ///
    /// A second call for the same provider replaces the record.  Fails
    /// with `Locked` when no key is held.
    pub fn encrypt_secret(&mut self, provider: &str, plaintext: &str) -> Result<()> {
        validate_provider(provider)?;
        let key = self.key.as_ref().ok_or(CredVaultError::Locked)?;

        let (ciphertext, nonce) = encrypt(plaintext.as_bytes(), key)?;
        let record = EncryptedSecretRecord {
            provider: provider.to_string(),
            ciphertext,
            nonce: nonce.to_vec(),
            created_at: Utc::now(),
        };

        self.store.commit(WriteBatch::new().upsert(record))
    }

    /// Decrypt and return the secret for `provider`.
    ///
    /// Returns `Ok(None)` when no record exists.  A record that fails
    /// authenticated decryption raises `Corrupted`: that signals data
    /// damage, not absence, and is never swallowed.
    pub fn decrypt_secret(&self, provider: &str) -> Result<Option<String>> {
        validate_provider(provider)?;
        if self.key.is_none() {
            return Err(CredVaultError::Locked);
        }

        let record = match self.store.load_secret(provider)? {
            Some(record) => record,
            None => return Ok(None),
        };

        let plaintext_bytes = self.decrypt_record(&record)?;

        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(plaintext_bytes)
            .map(Some)
            .map_err(|e| {
                let mut bad_bytes = e.into_bytes();
                bad_bytes.zeroize();
                tracing::error!(provider, "stored secret is not valid UTF-8");
                CredVaultError::Corrupted(provider.to_string())
            })
    }

    /// Remove the record for `provider`.  Succeeds even if none existed.
    pub fn delete_secret(&mut self, provider: &str) -> Result<()> {
        validate_provider(provider)?;
        self.store.commit(WriteBatch::new().delete(provider))
    }

    /// List all provider ids currently stored, sorted.
    pub fn list_providers(&self) -> Result<Vec<String>> {
        self.store.list_providers()
    }

    /// Number of stored secret records.
    pub fn secret_count(&self) -> Result<usize> {
        Ok(self.store.list_providers()?.len())
    }

    /// Metadata-only existence check; no decryption is performed.
    pub fn contains_secret(&self, provider: &str) -> Result<bool> {
        Ok(self.store.load_secret(provider)?.is_some())
    }

    /// Read-only access to the underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Decrypt one record under the held key, mapping an AEAD failure
    /// to `Corrupted` for that provider.
    fn decrypt_record(&self, record: &EncryptedSecretRecord) -> Result<Vec<u8>> {
        let key = self.key.as_ref().ok_or(CredVaultError::Locked)?;

        decrypt(&record.ciphertext, &record.nonce, key).map_err(|e| match e {
            CredVaultError::DecryptionFailed => {
                tracing::error!(
                    provider = record.provider.as_str(),
                    "stored secret failed authenticated decryption"
                );
                CredVaultError::Corrupted(record.provider.clone())
            }
            other => other,
        })
    }
}

/// Validate passphrase length (a character count, not bytes, so
/// multi-byte input is not over-counted).
fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(CredVaultError::PassphraseTooShort {
            min: MIN_PASSPHRASE_LEN,
        });
    }
    Ok(())
}

/// Validate that a provider id is safe to use as a record key.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty and at most 256 characters.
fn validate_provider(provider: &str) -> Result<()> {
    if provider.is_empty() {
        return Err(CredVaultError::InvalidProvider(
            "provider id cannot be empty".into(),
        ));
    }
    if provider.len() > 256 {
        return Err(CredVaultError::InvalidProvider(
            "provider id cannot exceed 256 characters".into(),
        ));
    }
    if !provider
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(CredVaultError::InvalidProvider(format!(
            "provider id '{provider}' contains invalid characters"
        )));
    }
    Ok(())
}
