//! Durable persistence of the single encrypted record.
//!
//! Exactly one row ever holds protected data. Consumers depend on the
//! `RecordStore` trait so tests can inject failing or in-memory
//! implementations; production uses the DuckDB-backed store.

use std::sync::{Arc, Mutex};

use duckdb::{params, Connection};
use notesafe_crypto::EncryptedRecord;

use crate::error::{VaultError, VaultResult};

const RECORD_KEY: &str = "encrypted_record";

/// Durable storage for the one encrypted vault record.
pub trait RecordStore: Send + Sync {
    fn load(&self) -> VaultResult<Option<EncryptedRecord>>;
    fn save(&self, record: &EncryptedRecord) -> VaultResult<()>;
    fn exists(&self) -> VaultResult<bool>;
}

/// DuckDB-backed record store: a key/value meta table holding the record
/// as a JSON string.
pub struct DuckDbRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbRecordStore {
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
            "CREATE TABLE IF NOT EXISTS vault_meta (
                key VARCHAR PRIMARY KEY,
                value VARCHAR NOT NULL
            );",
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl RecordStore for DuckDbRecordStore {
    fn load(&self) -> VaultResult<Option<EncryptedRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT value FROM vault_meta WHERE key = ?")
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let mut rows = stmt
            .query_map(params![RECORD_KEY], |row| row.get::<_, String>(0))
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        match rows.next() {
            Some(Ok(json)) => {
                let record: EncryptedRecord = serde_json::from_str(&json)
                    .map_err(|e| VaultError::Storage(format!("stored record unreadable: {e}")))?;
                Ok(Some(record))
            }
            Some(Err(e)) => Err(VaultError::Storage(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&self, record: &EncryptedRecord) -> VaultResult<()> {
        let json =
            serde_json::to_string(record).map_err(|e| VaultError::Storage(e.to_string()))?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO vault_meta (key, value) VALUES (?, ?)",
            params![RECORD_KEY, json],
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }

    fn exists(&self) -> VaultResult<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM vault_meta WHERE key = ?",
                params![RECORD_KEY],
                |row| row.get(0),
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(count > 0)
    }
}
