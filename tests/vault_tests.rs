//! Integration tests for the CredVault vault module.

use std::cell::Cell;
use std::rc::Rc;

use credvault::errors::CredVaultError;
use credvault::store::{FileStore, MemoryStore, RecordStore, WriteBatch};
use credvault::vault::record::{EncryptedSecretRecord, VaultConfig};
use credvault::vault::Vault;
use tempfile::TempDir;

const PASSPHRASE: &str = "a strong passphrase";

/// Helper: a fresh in-memory vault with the passphrase already set.
fn unlocked_vault() -> Vault<MemoryStore> {
    let mut vault = Vault::new(MemoryStore::new());
    vault
        .initialize_passphrase(PASSPHRASE)
        .expect("initialize passphrase");
    vault
}

// ---------------------------------------------------------------------------
// Passphrase gate
// ---------------------------------------------------------------------------

#[test]
fn initialize_rejects_short_passphrase() {
    let mut vault = Vault::new(MemoryStore::new());
    let result = vault.initialize_passphrase("short");
    assert!(matches!(
        result,
        Err(CredVaultError::PassphraseTooShort { min: 8 })
    ));
    assert!(!vault.is_passphrase_set().unwrap());
}

#[test]
fn initialize_twice_rejects_with_already_initialized() {
    let mut vault = unlocked_vault();
    let result = vault.initialize_passphrase("another passphrase");
    assert!(matches!(result, Err(CredVaultError::AlreadyInitialized)));
}

#[test]
fn initialize_leaves_vault_unlocked() {
    let vault = unlocked_vault();
    assert!(vault.is_passphrase_set().unwrap());
    assert!(vault.is_unlocked());
}

#[test]
fn unlock_without_configuration_is_not_found() {
    let mut vault = Vault::new(MemoryStore::new());
    let result = vault.unlock(PASSPHRASE);
    assert!(matches!(result, Err(CredVaultError::NotInitialized)));
}

#[test]
fn unlock_with_wrong_passphrase_returns_false_and_stays_locked() {
    let mut vault = unlocked_vault();
    vault.lock();

    let ok = vault.unlock("not the passphrase").expect("unlock must not error");
    assert!(!ok);
    assert!(!vault.is_unlocked());
}

#[test]
fn unlock_with_correct_passphrase_returns_true() {
    let mut vault = unlocked_vault();
    vault.lock();

    let ok = vault.unlock(PASSPHRASE).expect("unlock");
    assert!(ok);
    assert!(vault.is_unlocked());
}

#[test]
fn lock_is_idempotent() {
    let mut vault = unlocked_vault();
    vault.lock();
    vault.lock();
    vault.lock();
    assert!(!vault.is_unlocked());
}

// ---------------------------------------------------------------------------
// Secret CRUD
// ---------------------------------------------------------------------------

#[test]
fn encrypt_and_decrypt_secret_roundtrip() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-12345").expect("store secret");

    let value = vault.decrypt_secret("openai").expect("decrypt");
    assert_eq!(value.as_deref(), Some("sk-12345"));
}

#[test]
fn encrypt_secret_overwrites_previous_record() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-old").unwrap();
    vault.encrypt_secret("openai", "sk-new").unwrap();

    assert_eq!(vault.secret_count().unwrap(), 1);
    assert_eq!(
        vault.decrypt_secret("openai").unwrap().as_deref(),
        Some("sk-new")
    );
}

#[test]
fn decrypt_secret_returns_none_for_missing_provider() {
    let vault = unlocked_vault();
    assert!(vault.decrypt_secret("anthropic").unwrap().is_none());
}

#[test]
fn secret_operations_fail_when_locked() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-12345").unwrap();
    vault.lock();

    assert!(matches!(
        vault.encrypt_secret("openai", "sk-other"),
        Err(CredVaultError::Locked)
    ));
    assert!(matches!(
        vault.decrypt_secret("openai"),
        Err(CredVaultError::Locked)
    ));
}

#[test]
fn delete_secret_removes_record_and_tolerates_absent() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-12345").unwrap();

    vault.delete_secret("openai").expect("delete existing");
    assert!(!vault.contains_secret("openai").unwrap());

    vault.delete_secret("openai").expect("delete of absent record succeeds");
}

#[test]
fn list_providers_returns_sorted_ids() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-1").unwrap();
    vault.encrypt_secret("anthropic", "sk-2").unwrap();
    vault.encrypt_secret("google", "sk-3").unwrap();

    assert_eq!(
        vault.list_providers().unwrap(),
        vec!["anthropic", "google", "openai"]
    );
}

#[test]
fn provider_id_is_validated() {
    let mut vault = unlocked_vault();
    assert!(matches!(
        vault.encrypt_secret("", "sk-1"),
        Err(CredVaultError::InvalidProvider(_))
    ));
    assert!(matches!(
        vault.encrypt_secret("has space", "sk-1"),
        Err(CredVaultError::InvalidProvider(_))
    ));
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn tampered_record_raises_corrupted_not_not_found() {
    let mut store = MemoryStore::new();

    // Initialize through a vault, then tamper with the stored record
    // behind its back.
    let mut vault = Vault::new(MemoryStore::new());
    vault.initialize_passphrase(PASSPHRASE).unwrap();
    vault.encrypt_secret("openai", "sk-12345").unwrap();

    // Rebuild the same state in a store we control, with one ciphertext
    // bit flipped.
    let config: VaultConfig = vault_config_of(&vault);
    let mut record: EncryptedSecretRecord = record_of(&vault, "openai");
    record.ciphertext[0] ^= 0xFF;
    store
        .commit(WriteBatch::new().set_config(config).upsert(record))
        .unwrap();

    let mut tampered_vault = Vault::new(store);
    assert!(tampered_vault.unlock(PASSPHRASE).unwrap());

    let result = tampered_vault.decrypt_secret("openai");
    match result {
        Err(CredVaultError::Corrupted(provider)) => assert_eq!(provider, "openai"),
        other => panic!("expected Corrupted, got {other:?}"),
    }
}

/// Pull the config back out of a vault's store via the public trait.
fn vault_config_of(vault: &Vault<MemoryStore>) -> VaultConfig {
    vault
        .store()
        .load_config()
        .expect("load config")
        .expect("config present")
}

fn record_of(vault: &Vault<MemoryStore>, provider: &str) -> EncryptedSecretRecord {
    vault
        .store()
        .load_secret(provider)
        .expect("load record")
        .expect("record present")
}

// ---------------------------------------------------------------------------
// Passphrase rotation
// ---------------------------------------------------------------------------

#[test]
fn change_passphrase_reencrypts_all_secrets() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-1").unwrap();
    vault.encrypt_secret("anthropic", "sk-2").unwrap();

    let new_passphrase = "an even stronger passphrase";
    vault
        .change_passphrase(PASSPHRASE, new_passphrase)
        .expect("rotation");

    // Old passphrase no longer unlocks.
    vault.lock();
    assert!(!vault.unlock(PASSPHRASE).unwrap());

    // New passphrase unlocks and both secrets decrypt.
    assert!(vault.unlock(new_passphrase).unwrap());
    assert_eq!(vault.decrypt_secret("openai").unwrap().as_deref(), Some("sk-1"));
    assert_eq!(
        vault.decrypt_secret("anthropic").unwrap().as_deref(),
        Some("sk-2")
    );
}

#[test]
fn change_passphrase_rejects_short_new_passphrase_before_any_work() {
    let mut vault = unlocked_vault();
    let result = vault.change_passphrase(PASSPHRASE, "short");
    assert!(matches!(
        result,
        Err(CredVaultError::PassphraseTooShort { .. })
    ));

    // Old passphrase must still work.
    vault.lock();
    assert!(vault.unlock(PASSPHRASE).unwrap());
}

#[test]
fn change_passphrase_rejects_wrong_old_passphrase() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-1").unwrap();

    let result = vault.change_passphrase("wrong old one", "a new passphrase");
    assert!(matches!(result, Err(CredVaultError::IncorrectPassphrase)));

    vault.lock();
    assert!(vault.unlock(PASSPHRASE).unwrap());
    assert_eq!(vault.decrypt_secret("openai").unwrap().as_deref(), Some("sk-1"));
}

/// A store whose next commit can be made to fail, for atomicity tests.
struct FailingStore {
    inner: MemoryStore,
    fail_commits: Rc<Cell<bool>>,
}

impl RecordStore for FailingStore {
    fn load_config(&self) -> credvault::errors::Result<Option<VaultConfig>> {
        self.inner.load_config()
    }

    fn load_secret(
        &self,
        provider: &str,
    ) -> credvault::errors::Result<Option<EncryptedSecretRecord>> {
        self.inner.load_secret(provider)
    }

    fn list_providers(&self) -> credvault::errors::Result<Vec<String>> {
        self.inner.list_providers()
    }

    fn commit(&mut self, batch: WriteBatch) -> credvault::errors::Result<()> {
        if self.fail_commits.get() {
            return Err(CredVaultError::Storage("injected commit failure".into()));
        }
        self.inner.commit(batch)
    }
}

#[test]
fn failed_rotation_commit_leaves_old_state_fully_intact() {
    let fail_commits = Rc::new(Cell::new(false));
    let store = FailingStore {
        inner: MemoryStore::new(),
        fail_commits: Rc::clone(&fail_commits),
    };

    let mut vault = Vault::new(store);
    vault.initialize_passphrase(PASSPHRASE).unwrap();
    vault.encrypt_secret("openai", "sk-1").unwrap();
    vault.encrypt_secret("anthropic", "sk-2").unwrap();

    fail_commits.set(true);
    let result = vault.change_passphrase(PASSPHRASE, "a new passphrase");
    assert!(matches!(result, Err(CredVaultError::Storage(_))));
    fail_commits.set(false);

    // Nothing rotated: the old passphrase still opens everything.
    vault.lock();
    assert!(!vault.unlock("a new passphrase").unwrap());
    assert!(vault.unlock(PASSPHRASE).unwrap());
    assert_eq!(vault.decrypt_secret("openai").unwrap().as_deref(), Some("sk-1"));
    assert_eq!(
        vault.decrypt_secret("anthropic").unwrap().as_deref(),
        Some("sk-2")
    );
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[test]
fn reset_all_clears_everything_and_allows_reinitialization() {
    let mut vault = unlocked_vault();
    vault.encrypt_secret("openai", "sk-1").unwrap();
    vault.encrypt_secret("anthropic", "sk-2").unwrap();

    vault.reset_all().expect("reset");

    assert!(!vault.is_passphrase_set().unwrap());
    assert!(!vault.is_unlocked());
    assert!(vault.list_providers().unwrap().is_empty());

    // A fresh passphrase can be set afterwards.
    vault
        .initialize_passphrase("a brand new passphrase")
        .expect("re-initialize after reset");
    assert!(vault.is_passphrase_set().unwrap());
}

// ---------------------------------------------------------------------------
// File-backed persistence
// ---------------------------------------------------------------------------

#[test]
fn file_store_vault_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cred.vault");

    {
        let store = FileStore::open(&path).unwrap();
        let mut vault = Vault::new(store);
        vault.initialize_passphrase(PASSPHRASE).unwrap();
        vault.encrypt_secret("openai", "sk-persisted").unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    let mut vault = Vault::new(store);
    assert!(vault.is_passphrase_set().unwrap());
    assert!(vault.unlock(PASSPHRASE).unwrap());
    assert_eq!(
        vault.decrypt_secret("openai").unwrap().as_deref(),
        Some("sk-persisted")
    );
}
