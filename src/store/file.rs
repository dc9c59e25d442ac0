//! Single-file record store with atomic replace-on-commit.
//!
//! The on-disk layout:
//!
//! ```text
//! [CVLT: 4 bytes][version: 1 byte][body JSON]
//! ```
//!
//! - **Magic** (`CVLT`): identifies the file as a CredVault store.
//! - **Version**: format version (currently `1`).
//! - **Body JSON**: serialized config + secret records; binary fields
//!   are base64 strings.
//!
//! Every commit rewrites the whole file via temp-file + rename in the
//! same directory, which is the store's native atomic multi-write:
//! readers never observe a half-applied batch, even across a crash.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CredVaultError, Result};
use crate::vault::record::{EncryptedSecretRecord, VaultConfig};

use super::{RecordStore, StoreState, WriteBatch};

/// Magic bytes at the start of every store file.
const MAGIC: &[u8; 4] = b"CVLT";

/// Current file format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version).
const PREFIX_LEN: usize = 5;

/// JSON body of a store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreBody {
    config: Option<VaultConfig>,
    secrets: Vec<EncryptedSecretRecord>,
}

/// A `RecordStore` persisted to a single file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: StoreState,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one in memory if the
    /// file does not exist yet.  Nothing is written until the first
    /// commit.
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            Self::read_state(path)?
        } else {
            StoreState::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(path: &Path) -> Result<StoreState> {
        let data = fs::read(path)?;

        if data.len() < PREFIX_LEN {
            return Err(CredVaultError::InvalidStoreFormat(
                "file too small to be a valid store".into(),
            ));
        }
        if &data[0..4] != MAGIC {
            return Err(CredVaultError::InvalidStoreFormat(
                "missing CVLT magic bytes".into(),
            ));
        }
        let version = data[4];
        if version != CURRENT_VERSION {
            return Err(CredVaultError::InvalidStoreFormat(format!(
                "unsupported version {version}, expected {CURRENT_VERSION}"
            )));
        }

        let body: StoreBody = serde_json::from_slice(&data[PREFIX_LEN..])
            .map_err(|e| CredVaultError::InvalidStoreFormat(format!("body JSON: {e}")))?;

        let mut state = StoreState {
            config: body.config,
            ..StoreState::default()
        };
        for record in body.secrets {
            state.secrets.insert(record.provider.clone(), record);
        }
        Ok(state)
    }

    /// Serialize `state` and write it to disk atomically.
    ///
    /// Writes to a temp file in the same directory, then renames it
    /// over the target path so readers never see a half-written file.
    fn write_state(&self, state: &StoreState) -> Result<()> {
        let body = StoreBody {
            config: state.config.clone(),
            secrets: state.secrets.values().cloned().collect(),
        };
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| CredVaultError::SerializationError(format!("store body: {e}")))?;

        let mut buf = Vec::with_capacity(PREFIX_LEN + body_bytes.len());
        buf.extend_from_slice(MAGIC);
        buf.push(CURRENT_VERSION);
        buf.extend_from_slice(&body_bytes);

        let parent = self.path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        fs::write(&tmp_path, &buf)?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

impl RecordStore for FileStore {
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

        // Persist first; only adopt the new state once the file rename
        // has succeeded.
        self.write_state(&next)?;
        self.state = next;
        Ok(())
    }
}
