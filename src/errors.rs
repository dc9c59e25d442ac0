use thiserror::Error;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Validation errors ---
    #[error("Passphrase must be at least {min} characters")]
    PassphraseTooShort { min: usize },

    #[error("Invalid session configuration: {0}")]
    InvalidSessionConfig(String),

    #[error("Invalid provider id: {0}")]
    InvalidProvider(String),

    // --- Vault state errors ---
    #[error("Vault is locked")]
    Locked,

    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    #[error("No passphrase has been set for this vault")]
    NotInitialized,

    #[error("A passphrase is already set (use change_passphrase to replace it)")]
    AlreadyInitialized,

    #[error("A passphrase rotation is already in progress")]
    RotationInProgress,

    #[error("Stored secret for '{0}' failed authenticated decryption: data is corrupted or tampered")]
    Corrupted(String),

    // --- Crypto errors ---
    #[error("Secure random source unavailable: {0}")]
    CryptoUnavailable(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    // --- Store errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid store format: {0}")]
    InvalidStoreFormat(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
