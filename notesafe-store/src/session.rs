//! In-memory session state: the unlock password and decrypted payload.
//!
//! Modeled as an explicit state machine rather than ambient globals so the
//! locked/unlocked invariant is enforced at the type level: operations that
//! mutate the vault must go through [`VaultSession::unlocked_mut`], which
//! fails with [`VaultError::Locked`] when no session exists.
//!
//! Nothing in here is ever persisted. Locking drops both the password and
//! the plaintext payload.

use notesafe_types::VaultPayload;

use crate::error::{VaultError, VaultResult};

/// One unlock..lock cycle of session state.
pub enum VaultSession {
    Locked,
    Unlocked {
        password: String,
        payload: VaultPayload,
    },
}

impl VaultSession {
    pub fn unlocked(password: &str, payload: VaultPayload) -> Self {
        Self::Unlocked {
            password: password.to_string(),
            payload,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked { .. })
    }

    /// Read access to the decrypted payload, or `Locked`.
    pub fn payload(&self) -> VaultResult<&VaultPayload> {
        match self {
            Self::Unlocked { payload, .. } => Ok(payload),
            Self::Locked => Err(VaultError::Locked),
        }
    }

    /// The session password together with mutable payload access.
    ///
    /// Every mutating vault operation funnels through this, so the
    /// "mutation requires an active session" invariant has one enforcement
    /// point.
    pub fn unlocked_mut(&mut self) -> VaultResult<(&str, &mut VaultPayload)> {
        match self {
            Self::Unlocked { password, payload } => Ok((password.as_str(), payload)),
            Self::Locked => Err(VaultError::Locked),
        }
    }

    /// Discards password and plaintext payload.
    pub fn lock(&mut self) {
        *self = Self::Locked;
    }
}
