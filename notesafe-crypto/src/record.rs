//! The persisted encrypted record shape.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cipher::{NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{Salt, SALT_SIZE};

/// Current encrypted record format version.
pub const RECORD_VERSION: u32 = 1;

/// The single artifact ever written to durable storage for protected data.
///
/// Salt, nonce and ciphertext are base64 strings so the record survives any
/// JSON transport (durable store, export file, remote push) unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub version: u32,
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

impl EncryptedRecord {
    pub(crate) fn from_parts(salt: &Salt, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Self {
        Self {
            version: RECORD_VERSION,
            salt: BASE64.encode(salt.as_bytes()),
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
        }
    }

    pub(crate) fn salt_bytes(&self) -> CryptoResult<Salt> {
        let bytes = decode_field("salt", &self.salt)?;
        let arr: [u8; SALT_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::Malformed("salt has wrong length".into()))?;
        Ok(Salt::from_bytes(arr))
    }

    pub(crate) fn nonce_bytes(&self) -> CryptoResult<[u8; NONCE_SIZE]> {
        let bytes = decode_field("nonce", &self.nonce)?;
        bytes
            .try_into()
            .map_err(|_| CryptoError::Malformed("nonce has wrong length".into()))
    }

    pub(crate) fn ciphertext_bytes(&self) -> CryptoResult<Vec<u8>> {
        let bytes = decode_field("ciphertext", &self.ciphertext)?;
        if bytes.len() < TAG_SIZE {
            return Err(CryptoError::Malformed(
                "ciphertext shorter than AEAD tag".into(),
            ));
        }
        Ok(bytes)
    }

    /// Validates an untrusted JSON value (e.g. an imported backup file)
    /// against the record schema.
    ///
    /// Runs entirely before key derivation: a malformed file is rejected
    /// without paying the PBKDF2 cost.
    pub fn from_json_value(value: &Value) -> CryptoResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| CryptoError::Malformed("record is not an object".into()))?;

        match obj.get("version") {
            Some(v) if v.is_u64() => {}
            Some(_) => return Err(CryptoError::Malformed("version is not a number".into())),
            None => return Err(CryptoError::Malformed("missing field: version".into())),
        }
        for field in ["salt", "nonce", "ciphertext"] {
            match obj.get(field) {
                Some(v) if v.is_string() => {}
                Some(_) => {
                    return Err(CryptoError::Malformed(format!("{field} is not a string")))
                }
                None => return Err(CryptoError::Malformed(format!("missing field: {field}"))),
            }
        }

        let record: Self = serde_json::from_value(value.clone())
            .map_err(|e| CryptoError::Malformed(e.to_string()))?;

        // Decode checks ensure the base64 content has plausible lengths
        record.salt_bytes()?;
        record.nonce_bytes()?;
        record.ciphertext_bytes()?;
        Ok(record)
    }
}

fn decode_field(field: &str, encoded: &str) -> CryptoResult<Vec<u8>> {
    BASE64
        .decode(encoded)
        .map_err(|_| CryptoError::Malformed(format!("{field} is not valid base64")))
}
