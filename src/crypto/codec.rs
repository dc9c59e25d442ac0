//! Byte/text codec helpers for persisting binary material.
//!
//! Ciphertext, nonces, and salts are raw bytes; the store layer keeps
//! its records as JSON, so these fields travel as base64 strings.  The
//! serde adapters are applied via `#[serde(serialize_with, deserialize_with)]`
//! on the record types.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::errors::{CredVaultError, Result};

/// Encode bytes as a standard base64 string.
pub fn encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode a standard base64 string back into bytes.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text)
        .map_err(|e| CredVaultError::SerializationError(format!("invalid base64: {e}")))
}

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
