//! Document, attachment and payload types.
//!
//! Serde renames pin the wire shape to the portable export schema
//! (`createdAt`, `exportedAt`, attachment `type`/`dataUrl`), so Rust field
//! names stay idiomatic while the JSON stays compatible with existing
//! export files.

use serde::{Deserialize, Serialize};

/// Current payload format version.
pub const PAYLOAD_VERSION: u32 = 1;

/// Title assigned to freshly created documents.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A single rich-text document stored in the vault.
///
/// `content` is an opaque editor value — the vault never interprets it
/// except for the search engine's plain-text extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub version: u32,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A binary attachment, stored by value as an inline data URL.
///
/// Vault size grows with total attachment bytes — there is no separate
/// blob store for protected data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "dataUrl")]
    pub data_url: String,
}

/// The complete plaintext vault contents.
///
/// Exactly this structure, serialized as UTF-8 JSON, is what gets
/// encrypted into the persisted record. It is also the plaintext export
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultPayload {
    pub version: u32,
    #[serde(rename = "exportedAt")]
    pub exported_at: i64,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub uploads: Vec<Attachment>,
}

impl Default for VaultPayload {
    fn default() -> Self {
        Self {
            version: PAYLOAD_VERSION,
            exported_at: 0,
            documents: Vec::new(),
            uploads: Vec::new(),
        }
    }
}

impl VaultPayload {
    /// Next free document id: `max(existing ids, 0) + 1`.
    pub fn next_document_id(&self) -> i64 {
        self.documents.iter().map(|d| d.id).max().unwrap_or(0).max(0) + 1
    }

    pub fn document(&self, id: i64) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn document_mut(&mut self, id: i64) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.uploads.is_empty()
    }
}

impl Document {
    /// Adds a tag if no case-insensitive, whitespace-normalized duplicate
    /// exists. The first-seen casing is what gets stored.
    ///
    /// Returns `true` if the tag was added.
    pub fn add_tag(&mut self, raw: &str) -> bool {
        let display = normalize_whitespace(raw);
        if display.is_empty() {
            return false;
        }
        let key = display.to_lowercase();
        if self.tags.iter().any(|t| normalize_tag(t) == key) {
            return false;
        }
        self.tags.push(display);
        true
    }

    /// Whether the document carries a tag matching `key`
    /// (case-insensitive, whitespace-normalized).
    pub fn has_tag(&self, key: &str) -> bool {
        let key = normalize_tag(key);
        !key.is_empty() && self.tags.iter().any(|t| normalize_tag(t) == key)
    }
}

/// Trims and collapses internal whitespace runs to single spaces,
/// preserving case.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The comparison key for a tag: whitespace-normalized and lowercased.
pub fn normalize_tag(raw: &str) -> String {
    normalize_whitespace(raw).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_id_is_max_plus_one() {
        let mut payload = VaultPayload::default();
        assert_eq!(payload.next_document_id(), 1);

        payload.documents.push(Document {
            id: 7,
            version: 1,
            title: DEFAULT_TITLE.to_string(),
            created_at: 0,
            content: None,
            tags: vec![],
        });
        payload.documents.push(Document {
            id: 3,
            version: 1,
            title: DEFAULT_TITLE.to_string(),
            created_at: 0,
            content: None,
            tags: vec![],
        });
        assert_eq!(payload.next_document_id(), 8);
    }

    #[test]
    fn tag_dedup_is_case_and_space_insensitive() {
        let mut doc = Document {
            id: 1,
            version: 1,
            title: DEFAULT_TITLE.to_string(),
            created_at: 0,
            content: None,
            tags: vec![],
        };

        assert!(doc.add_tag("  Foo   Bar "));
        assert!(!doc.add_tag("foo bar"));
        assert!(!doc.add_tag("FOO  BAR"));

        // First-seen casing is preserved for display
        assert_eq!(doc.tags, vec!["Foo Bar".to_string()]);
        assert!(doc.has_tag("foo bar"));
        assert!(doc.has_tag(" FOO BAR "));
        assert!(!doc.has_tag(""));
    }
}
