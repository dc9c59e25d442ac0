//! In-memory record store.
//!
//! Backs tests and hosts that keep the encrypted records elsewhere.
//! Commit stages the batch against a clone of the state and swaps it
//! in, so atomicity is trivial.

use crate::errors::Result;
use crate::vault::record::{EncryptedSecretRecord, VaultConfig};

use super::{RecordStore, StoreState, WriteBatch};

/// A `RecordStore` that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: StoreState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load_config(&self) -> Result<Option<VaultConfig>> {
        Ok(self.state.config.clone())
    }

    fn load_secret(&self, provider: &str) -> Result<Option<EncryptedSecretRecord>> {
        Ok(self.state.secrets.get(provider).cloned())
    }

    fn list_providers(&self) -> Result<Vec<String>> {
        Ok(self.state.providers())
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        let mut next = self.state.clone();
        batch.apply(&mut next);
        self.state = next;
        Ok(())
    }
}
