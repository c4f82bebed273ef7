//! Error taxonomy for the vault store.
//!
//! Crypto and storage failures are never recovered here; they propagate to
//! the caller, which owns user-facing messaging and any manual retry.

use notesafe_crypto::CryptoError;
use notesafe_types::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// An operation that needs session state ran with no active session.
    /// Recoverable by unlocking first; never auto-retried.
    #[error("vault is locked")]
    Locked,

    /// AEAD authentication failure: wrong password or corrupted record.
    /// Deliberately does not say which.
    #[error("authentication failed — check your password")]
    Authentication,

    /// Export requested before any record has ever been persisted.
    #[error("no encrypted vault has been persisted yet")]
    EmptyVault,

    #[error("password too short (min 8 characters)")]
    PasswordTooShort,

    /// An imported file failed structural validation before decryption.
    #[error("malformed import: {0}")]
    MalformedImport(String),

    /// Underlying persistent-store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Non-authentication crypto failure.
    #[error("crypto error: {0}")]
    Crypto(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Authentication => VaultError::Authentication,
            CryptoError::Malformed(msg) => VaultError::MalformedImport(msg),
            other => VaultError::Crypto(other.to_string()),
        }
    }
}

impl From<SchemaError> for VaultError {
    fn from(err: SchemaError) -> Self {
        VaultError::MalformedImport(err.to_string())
    }
}
