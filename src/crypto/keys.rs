//! The in-memory derived key handle.
//!
//! `DerivedKey` is the only representation of key material in this
//! crate.  Its bytes are private to the crate, it has no serde support,
//! its `Debug` output is redacted, and the backing buffer is zeroed
//! when the handle is dropped.  Dropping the handle is how `lock()`
//! discards the key.

use std::fmt;

use zeroize::Zeroize;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub(crate) const KEY_LEN: usize = 32;

/// A 32-byte AES key derived from a passphrase and salt.
///
/// Exists only between unlock and lock.  Callers outside the crate can
/// hold one and pass it to the encrypt/decrypt primitives, but cannot
/// read its bytes.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    pub(crate) fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes to build a cipher.  Crate-internal.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}
