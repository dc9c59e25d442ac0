//! CredVault: a local encrypted vault for provider API credentials.
//!
//! Three layers, each depending only on the one below:
//!
//! 1. [`crypto`]: key derivation, AES-256-GCM, random generation,
//!    byte/text codecs.  Stateless functions over byte buffers.
//! 2. [`vault`]: owns the derived key, manages the passphrase
//!    lifecycle, and encrypts before store / decrypts after load.
//! 3. [`session`]: the lock state machine that auto-expires the
//!    unlocked state after inactivity and notifies observers.
//!
//! Persistence goes through the [`store::RecordStore`] trait; the
//! crate ships an in-memory store and an atomic single-file store.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod session;
pub mod store;
pub mod vault;
