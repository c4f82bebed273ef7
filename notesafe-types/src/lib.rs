//! Plaintext vault data model for Notesafe.
//!
//! Defines the shapes that live *inside* the encrypted vault blob:
//! documents, inline attachments and the `VaultPayload` envelope that is
//! serialized to UTF-8 JSON before encryption. The same serde shapes double
//! as the portable export/import schema, so an export file and the vault
//! plaintext are byte-compatible.
//!
//! Nothing in this crate touches keys or storage — higher layers
//! (`notesafe-crypto`, `notesafe-store`) own those concerns.

mod codec;
mod model;

pub use codec::{encode_data_url, validate_payload, SchemaError, SchemaResult};
pub use model::{
    normalize_tag, normalize_whitespace, Attachment, Document, VaultPayload, DEFAULT_TITLE,
    PAYLOAD_VERSION,
};
