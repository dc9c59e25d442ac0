//! The persistent record store consumed by the vault.
//!
//! The vault does not implement persistence itself; it talks to a
//! [`RecordStore`], which holds the `VaultConfig` and one
//! `EncryptedSecretRecord` per provider.  Every write goes through
//! [`RecordStore::commit`] with a [`WriteBatch`], the atomic multi-write
//! primitive that passphrase rotation and reset depend on: a commit
//! applies the whole batch or none of it.
//!
//! Two implementations ship with the crate:
//! - `MemoryStore` for tests and ephemeral hosts (`memory`)
//! - `FileStore`, a single-file store written atomically via
//!   temp-file + rename (`file`)

use std::collections::BTreeMap;

use crate::errors::Result;
use crate::vault::record::{EncryptedSecretRecord, VaultConfig};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Minimal contract the vault needs from persistent storage.
pub trait RecordStore {
    /// Load the vault configuration, if one has been committed.
    fn load_config(&self) -> Result<Option<VaultConfig>>;

    /// Load the encrypted record for `provider`, if present.
    fn load_secret(&self, provider: &str) -> Result<Option<EncryptedSecretRecord>>;

    /// List all stored provider ids, sorted.
    fn list_providers(&self) -> Result<Vec<String>>;

    /// Apply a batch of writes atomically.
    ///
    /// On error, none of the batch may be visible to subsequent reads.
    fn commit(&mut self, batch: WriteBatch) -> Result<()>;
}

/// A set of writes applied as one atomic unit.
///
/// Single-record operations are one-element batches, so "last write
/// wins" for a provider is decided purely by commit order.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    /// `None` leaves the config untouched; `Some(None)` clears it;
    /// `Some(Some(_))` replaces it.
    config: Option<Option<VaultConfig>>,
    upserts: Vec<EncryptedSecretRecord>,
    deletes: Vec<String>,
    clear_secrets: bool,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the vault configuration.
    pub fn set_config(mut self, config: VaultConfig) -> Self {
        self.config = Some(Some(config));
        self
    }

    /// Delete the vault configuration.
    pub fn clear_config(mut self) -> Self {
        self.config = Some(None);
        self
    }

    /// Insert or overwrite a secret record.
    pub fn upsert(mut self, record: EncryptedSecretRecord) -> Self {
        self.upserts.push(record);
        self
    }

    /// Delete the record for `provider`.  Deleting an absent record is
    /// not an error.
    pub fn delete(mut self, provider: &str) -> Self {
        self.deletes.push(provider.to_string());
        self
    }

    /// Delete every secret record.
    pub fn clear_secrets(mut self) -> Self {
        self.clear_secrets = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_none()
            && self.upserts.is_empty()
            && self.deletes.is_empty()
            && !self.clear_secrets
    }

    /// Apply this batch to an in-memory state snapshot.
    ///
    /// Stores use this on a copy of their state so a failed persist
    /// leaves the visible state untouched.  Order: clear, then
    /// deletes, then upserts, so an upsert in the same batch as a
    /// clear survives.
    pub fn apply(&self, state: &mut StoreState) {
        if self.clear_secrets {
            state.secrets.clear();
        }
        for provider in &self.deletes {
            state.secrets.remove(provider);
        }
        for record in &self.upserts {
            state.secrets.insert(record.provider.clone(), record.clone());
        }
        if let Some(ref config) = self.config {
            state.config = config.clone();
        }
    }
}

/// Full snapshot of everything a store holds.
///
/// `BTreeMap` keeps provider listing deterministic.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub config: Option<VaultConfig>,
    pub secrets: BTreeMap<String, EncryptedSecretRecord>,
}

impl StoreState {
    pub fn providers(&self) -> Vec<String> {
        self.secrets.keys().cloned().collect()
    }
}
