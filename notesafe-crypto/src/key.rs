//! Password-based key derivation.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the PBKDF2 salt in bytes.
pub const SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count. Raising this changes nothing on
/// disk (the salt travels with the record), it only slows derivation.
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Random salt mixed into key derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh salt from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A derived symmetric key. Zeroized on drop, never serialized.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Derives a 256-bit key from a password and salt.
///
/// Deterministic: the same `(password, salt)` pair always yields the same
/// key, which is how a stored record can be reopened at all.
pub fn derive_key(password: &str, salt: &Salt) -> DerivedKey {
    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut out,
    );
    let key = DerivedKey(out);
    out.zeroize();
    key
}
