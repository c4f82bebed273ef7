//! Error types for the crypto layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD tag verification failed. Deliberately does not distinguish a
    /// wrong password from a corrupted or tampered record.
    #[error("authentication failed — check your password")]
    Authentication,

    /// A record failed structural validation before any key derivation.
    #[error("malformed encrypted record: {0}")]
    Malformed(String),

    #[error("unsupported record version: {0}")]
    UnsupportedVersion(u32),

    #[error("encryption failed: {0}")]
    Encryption(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
