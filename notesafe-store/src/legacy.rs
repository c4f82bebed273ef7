//! The legacy unprotected store.
//!
//! Documents and attachments written before encryption existed live in two
//! plain tables: integer-keyed documents and string-keyed attachments with
//! raw binary payloads. The vault reads this store exactly once, during
//! first-run migration, and clears it afterwards — never before the
//! encrypted replacement has been persisted.

use std::sync::{Arc, Mutex};

use duckdb::{params, Connection};
use notesafe_types::{encode_data_url, Attachment, Document};
use tracing::debug;

use crate::error::{VaultError, VaultResult};

/// Read/clear interface for the pre-encryption local store.
pub trait LegacyStore: Send + Sync {
    /// Reads every legacy document and attachment. Attachment payloads are
    /// converted from raw bytes to inline data URLs on the way out.
    fn read_all(&self) -> VaultResult<(Vec<Document>, Vec<Attachment>)>;

    /// Drops all legacy rows. Only called after the encrypted replacement
    /// has been durably persisted.
    fn clear(&self) -> VaultResult<()>;
}

/// DuckDB-backed legacy store.
pub struct DuckDbLegacyStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbLegacyStore {
    pub fn open(conn: Arc<Mutex<Connection>>) -> VaultResult<Self> {
        let store = Self { conn };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> VaultResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS legacy_documents (
                id BIGINT PRIMARY KEY,
                version INTEGER NOT NULL DEFAULT 1,
                title VARCHAR NOT NULL,
                created_at BIGINT NOT NULL,
                content_json VARCHAR,
                tags_json VARCHAR
            );
            CREATE TABLE IF NOT EXISTS legacy_attachments (
                id VARCHAR PRIMARY KEY,
                name VARCHAR NOT NULL,
                mime_type VARCHAR NOT NULL,
                created_at BIGINT NOT NULL,
                payload BLOB NOT NULL
            );",
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Seeds a legacy document row (pre-encryption writer surface).
    pub fn insert_document(&self, doc: &Document) -> VaultResult<()> {
        let content_json = doc
            .content
            .as_ref()
            .map(|c| serde_json::to_string(c))
            .transpose()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        let tags_json = serde_json::to_string(&doc.tags)
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO legacy_documents (id, version, title, created_at, content_json, tags_json)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![doc.id, doc.version, doc.title, doc.created_at, content_json, tags_json],
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Seeds a legacy attachment row with a raw binary payload.
    pub fn insert_attachment(
        &self,
        id: &str,
        name: &str,
        mime_type: &str,
        created_at: i64,
        payload: &[u8],
    ) -> VaultResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO legacy_attachments (id, name, mime_type, created_at, payload)
             VALUES (?, ?, ?, ?, ?)",
            params![id, name, mime_type, created_at, payload],
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl LegacyStore for DuckDbLegacyStore {
    fn read_all(&self) -> VaultResult<(Vec<Document>, Vec<Attachment>)> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, version, title, created_at, content_json, tags_json
                 FROM legacy_documents ORDER BY id",
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let documents: Vec<Document> = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })
            .map_err(|e| VaultError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .map(|(id, version, title, created_at, content_json, tags_json)| Document {
                id,
                version,
                title,
                created_at,
                content: content_json.and_then(|c| serde_json::from_str(&c).ok()),
                tags: tags_json
                    .and_then(|t| serde_json::from_str(&t).ok())
                    .unwrap_or_default(),
            })
            .collect();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, mime_type, created_at, payload
                 FROM legacy_attachments ORDER BY created_at",
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let uploads: Vec<Attachment> = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(|e| VaultError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .map(|(id, name, mime_type, created_at, payload)| Attachment {
                id,
                name,
                data_url: encode_data_url(&mime_type, &payload),
                mime_type,
                size: payload.len() as u64,
                created_at,
            })
            .collect();

        debug!(
            documents = documents.len(),
            uploads = uploads.len(),
            "read legacy unprotected store"
        );
        Ok((documents, uploads))
    }

    fn clear(&self) -> VaultResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        conn.execute_batch("DELETE FROM legacy_documents; DELETE FROM legacy_attachments;")
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        debug!("cleared legacy unprotected store");
        Ok(())
    }
}
