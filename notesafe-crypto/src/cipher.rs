//! AES-256-GCM seal/open for vault payload bytes.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::{rngs::OsRng, RngCore};

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, DerivedKey, Salt};
use crate::record::{EncryptedRecord, RECORD_VERSION};

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag appended to the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` under a key derived from `password`.
///
/// A fresh salt and nonce are drawn from the OS RNG on every call, so two
/// encryptions of the same payload never share key material or nonce.
pub fn encrypt(password: &str, plaintext: &[u8]) -> CryptoResult<EncryptedRecord> {
    let salt = Salt::random();
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let ciphertext = cipher(&key)?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedRecord::from_parts(&salt, &nonce, &ciphertext))
}

/// Decrypts a record by re-deriving the key from its stored salt.
///
/// Fails with [`CryptoError::Authentication`] when the GCM tag does not
/// verify — the sole wrong-password signal in the system.
pub fn decrypt(password: &str, record: &EncryptedRecord) -> CryptoResult<Vec<u8>> {
    if record.version != RECORD_VERSION {
        return Err(CryptoError::UnsupportedVersion(record.version));
    }

    let salt = record.salt_bytes()?;
    let nonce = record.nonce_bytes()?;
    let ciphertext = record.ciphertext_bytes()?;

    let key = derive_key(password, &salt);
    cipher(&key)?
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| CryptoError::Authentication)
}

fn cipher(key: &DerivedKey) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}
