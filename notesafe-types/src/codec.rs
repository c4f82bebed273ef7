//! Portable-schema validation and attachment encoding helpers.
//!
//! Import files come from outside the trust boundary, so structural
//! validation runs before anything else looks at the payload — a malformed
//! file must be rejected without spending cycles downstream.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;
use thiserror::Error;

use crate::model::VaultPayload;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed payload: {0}")]
    Malformed(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Encodes raw attachment bytes as an inline `data:` URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

/// Validates an untrusted JSON value against the portable payload schema
/// and deserializes it.
///
/// Field presence and types are checked explicitly so rejection messages
/// name the offending field instead of surfacing a serde path.
pub fn validate_payload(value: &Value) -> SchemaResult<VaultPayload> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::Malformed("payload is not an object".into()))?;

    require_number(obj, "version")?;
    require_number(obj, "exportedAt")?;

    let documents = require_array(obj, "documents")?;
    for (i, doc) in documents.iter().enumerate() {
        let doc = doc
            .as_object()
            .ok_or_else(|| SchemaError::Malformed(format!("documents[{i}] is not an object")))?;
        require_number(doc, "id")?;
        require_number(doc, "version")?;
        require_string(doc, "title")?;
        require_number(doc, "createdAt")?;
        if let Some(tags) = doc.get("tags") {
            if !tags.is_array() {
                return Err(SchemaError::Malformed(format!(
                    "documents[{i}].tags is not an array"
                )));
            }
        }
    }

    let uploads = require_array(obj, "uploads")?;
    for (i, upload) in uploads.iter().enumerate() {
        let upload = upload
            .as_object()
            .ok_or_else(|| SchemaError::Malformed(format!("uploads[{i}] is not an object")))?;
        require_string(upload, "id")?;
        require_string(upload, "name")?;
        require_string(upload, "type")?;
        require_number(upload, "size")?;
        require_number(upload, "createdAt")?;
        require_string(upload, "dataUrl")?;
    }

    serde_json::from_value(value.clone())
        .map_err(|e| SchemaError::Malformed(format!("payload deserialization failed: {e}")))
}

fn require_number(obj: &serde_json::Map<String, Value>, field: &str) -> SchemaResult<()> {
    match obj.get(field) {
        Some(v) if v.is_number() => Ok(()),
        Some(_) => Err(SchemaError::Malformed(format!("{field} is not a number"))),
        None => Err(SchemaError::Malformed(format!("missing field: {field}"))),
    }
}

fn require_string(obj: &serde_json::Map<String, Value>, field: &str) -> SchemaResult<()> {
    match obj.get(field) {
        Some(v) if v.is_string() => Ok(()),
        Some(_) => Err(SchemaError::Malformed(format!("{field} is not a string"))),
        None => Err(SchemaError::Malformed(format!("missing field: {field}"))),
    }
}

fn require_array<'a>(
    obj: &'a serde_json::Map<String, Value>,
    field: &str,
) -> SchemaResult<&'a Vec<Value>> {
    obj.get(field)
        .ok_or_else(|| SchemaError::Malformed(format!("missing field: {field}")))?
        .as_array()
        .ok_or_else(|| SchemaError::Malformed(format!("{field} is not an array")))
}
