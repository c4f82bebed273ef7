//! Key derivation and AEAD codec for Notesafe.
//!
//! Turns a password plus a random salt into a symmetric key and seals the
//! serialized vault payload into a single portable record:
//! - PBKDF2-HMAC-SHA256 (310,000 iterations) for key derivation
//! - AES-256-GCM for authenticated encryption
//! - Derived keys are zeroized on drop and never serialized
//!
//! There is no separate password check anywhere: a wrong password and a
//! tampered record both surface as the same AEAD authentication failure,
//! so an attacker learns nothing about which of the two it was.
//!
//! Salt and nonce are regenerated from the OS RNG on every encryption,
//! which is what keeps nonces from repeating under one key lineage.

mod cipher;
mod error;
mod key;
mod record;

pub use cipher::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, DerivedKey, Salt, KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE};
pub use record::{EncryptedRecord, RECORD_VERSION};
