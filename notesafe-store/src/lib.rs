//! Encrypted vault store for Notesafe.
//!
//! Owns the on-disk encrypted record and the legacy unprotected store, and
//! exposes lock/unlock, one-way migration, document/attachment CRUD, and
//! export/restore. Every mutation funnels through a single
//! re-encrypt-and-persist path: the whole plaintext payload is serialized,
//! sealed under the session password and written as one record. There is no
//! delta encryption — the persisted record is always a complete, internally
//! consistent snapshot.
//!
//! Durable storage is DuckDB behind a shared connection; the encrypted
//! record lives in a key/value meta table and legacy data in plain tables.
//! Content edits are debounced through a single-slot saver (see `saver`).

mod error;
mod legacy;
mod record;
mod saver;
mod session;

pub use error::{VaultError, VaultResult};
pub use legacy::{DuckDbLegacyStore, LegacyStore};
pub use record::{DuckDbRecordStore, RecordStore};
pub use saver::{DebouncedSaver, PendingSave, QUIET_PERIOD};
pub use session::VaultSession;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use duckdb::Connection;
use notesafe_crypto::{decrypt, encrypt, EncryptedRecord};
use notesafe_types::{validate_payload, Attachment, Document, VaultPayload, DEFAULT_TITLE};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Minimum password length accepted when creating a vault or changing the
/// password. Unlocking an existing vault takes whatever was set.
pub const MIN_PASSWORD_LEN: usize = 8;

// ============================================================================
// VaultStore
// ============================================================================

/// The vault store: encrypted record + legacy store + session state.
pub struct VaultStore {
    records: Arc<dyn RecordStore>,
    legacy: Arc<dyn LegacyStore>,
    session: RwLock<VaultSession>,
    saver: Mutex<DebouncedSaver>,
}

impl VaultStore {
    /// Opens a vault store backed by a DuckDB file.
    pub fn open(db_path: &Path) -> VaultResult<Self> {
        let conn = if db_path.to_str() == Some(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(db_path)
        }
        .map_err(|e| VaultError::Storage(e.to_string()))?;

        // Cap memory/threads — DuckDB defaults to ~80% RAM per connection
        if db_path.to_str() != Some(":memory:") {
            conn.execute_batch("PRAGMA memory_limit='64MB'; PRAGMA threads=1;")
                .map_err(|e| VaultError::Storage(e.to_string()))?;
        }

        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// Opens a vault store with an in-memory database.
    pub fn open_in_memory() -> VaultResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| VaultError::Storage(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn from_connection(conn: Arc<Mutex<Connection>>) -> VaultResult<Self> {
        let records = Arc::new(DuckDbRecordStore::open(conn.clone())?);
        let legacy = Arc::new(DuckDbLegacyStore::open(conn)?);
        Ok(Self::with_stores(records, legacy))
    }

    /// Builds a store from explicit record/legacy backends.
    pub fn with_stores(records: Arc<dyn RecordStore>, legacy: Arc<dyn LegacyStore>) -> Self {
        Self {
            records,
            legacy,
            session: RwLock::new(VaultSession::Locked),
            saver: Mutex::new(DebouncedSaver::new()),
        }
    }

    // ========================================================================
    // Lifecycle: unlock, migration, lock
    // ========================================================================

    /// Whether a persisted encrypted record exists. Side-effect-free.
    pub fn has_encrypted_vault(&self) -> VaultResult<bool> {
        self.records.exists()
    }

    pub fn is_unlocked(&self) -> bool {
        // A poisoned session lock reads as locked
        self.session
            .read()
            .map(|s| s.is_unlocked())
            .unwrap_or(false)
    }

    /// Unlock/bootstrap entry point.
    ///
    /// With a persisted record: decrypts it and caches the session. Without
    /// one (first run): migrates the legacy unprotected store into a fresh
    /// encrypted vault. The migration persists the encrypted record
    /// *before* clearing the legacy rows — a persist failure leaves the
    /// legacy data intact.
    pub fn initialize_vault(&self, password: &str) -> VaultResult<VaultPayload> {
        if let Some(record) = self.records.load()? {
            // Existing vault: the AEAD tag check is the password check.
            // On failure the session stays locked.
            let payload = decrypt_payload(password, &record)?;
            *self.session_write()? = VaultSession::unlocked(password, payload.clone());
            info!(documents = payload.documents.len(), "vault unlocked");
            return Ok(payload);
        }

        if password.len() < MIN_PASSWORD_LEN {
            return Err(VaultError::PasswordTooShort);
        }

        let (documents, uploads) = self.legacy.read_all()?;
        let migrated = !documents.is_empty() || !uploads.is_empty();
        let mut payload = VaultPayload {
            documents,
            uploads,
            ..VaultPayload::default()
        };
        payload.exported_at = now_millis();

        let record = encrypt_payload(password, &payload)?;
        self.records.save(&record)?;
        // Only now is it safe to destroy the unprotected copy
        self.legacy.clear()?;

        if migrated {
            info!(
                documents = payload.documents.len(),
                uploads = payload.uploads.len(),
                "migrated legacy store into encrypted vault"
            );
        } else {
            info!("created empty encrypted vault");
        }

        *self.session_write()? = VaultSession::unlocked(password, payload.clone());
        Ok(payload)
    }

    /// Flushes any pending content save, then discards the session
    /// password and plaintext payload.
    pub fn lock(&self) {
        if let Err(e) = self.flush_pending_saves() {
            warn!(error = %e, "failed to flush pending save while locking");
        }
        // Locking must clear the session even through a poisoned lock
        match self.session.write() {
            Ok(mut session) => session.lock(),
            Err(poisoned) => poisoned.into_inner().lock(),
        }
        info!("vault locked");
    }

    /// Re-encrypts the vault under a new password.
    ///
    /// The old password is verified by decrypting the stored record; there
    /// is no other password check to pass.
    pub fn change_password(&self, old_password: &str, new_password: &str) -> VaultResult<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(VaultError::PasswordTooShort);
        }
        self.flush_pending_saves()?;

        let record = self.records.load()?.ok_or(VaultError::EmptyVault)?;
        let plaintext = decrypt(old_password, &record)?;
        let reencrypted = encrypt(new_password, &plaintext)?;
        self.records.save(&reencrypted)?;

        let mut session = self.session_write()?;
        if let VaultSession::Unlocked { password, .. } = &mut *session {
            *password = new_password.to_string();
        }
        info!("vault password changed");
        Ok(())
    }

    // ========================================================================
    // Export / restore
    // ========================================================================

    /// The persisted record, unchanged — exports are bit-identical to what
    /// is stored. Fails with `EmptyVault` before anything was ever saved.
    pub fn encrypted_record_for_export(&self) -> VaultResult<EncryptedRecord> {
        self.flush_pending_saves()?;
        self.records.load()?.ok_or(VaultError::EmptyVault)
    }

    /// Decrypts an externally supplied record and, on success, replaces the
    /// persisted record and session wholesale (last-writer-wins, no merge).
    /// The legacy store is cleared as a safety measure. A wrong password
    /// leaves the previous vault untouched.
    pub fn restore_from_encrypted_record(
        &self,
        password: &str,
        record: &EncryptedRecord,
    ) -> VaultResult<VaultPayload> {
        let payload = decrypt_payload(password, record)?;

        self.records.save(record)?;
        self.legacy.clear()?;
        // Any pending edit belongs to the replaced vault — drop it
        self.saver_lock()?.take_pending();
        *self.session_write()? = VaultSession::unlocked(password, payload.clone());

        info!(
            documents = payload.documents.len(),
            "vault restored from imported record"
        );
        Ok(payload)
    }

    /// Restore from an untrusted JSON import. Structural validation runs
    /// before key derivation, so a malformed file never costs a PBKDF2 run.
    pub fn restore_from_json(&self, password: &str, value: &Value) -> VaultResult<VaultPayload> {
        let record = EncryptedRecord::from_json_value(value)?;
        self.restore_from_encrypted_record(password, &record)
    }

    /// The decrypted payload in its portable JSON form.
    pub fn export_payload_json(&self) -> VaultResult<Value> {
        self.flush_pending_saves()?;
        let session = self.session_read()?;
        let payload = session.payload()?;
        serde_json::to_value(payload).map_err(|e| VaultError::Storage(e.to_string()))
    }

    /// Unconditionally overwrites the in-memory payload and persists.
    /// Caller is responsible for having validated/decrypted it first.
    pub fn replace_vault(&self, payload: VaultPayload) -> VaultResult<()> {
        self.saver_lock()?.take_pending();

        let mut session = self.session_write()?;
        let (password, current) = session.unlocked_mut()?;
        *current = payload;
        self.persist(password, current, "replace_vault")?;
        info!("vault replaced from plaintext payload");
        Ok(())
    }

    /// Replace from an untrusted plaintext export: structural validation,
    /// then [`VaultStore::replace_vault`].
    pub fn replace_vault_from_json(&self, value: &Value) -> VaultResult<()> {
        let payload = validate_payload(value)?;
        self.replace_vault(payload)
    }

    // ========================================================================
    // Document CRUD
    // ========================================================================

    pub fn list_documents(&self) -> VaultResult<Vec<Document>> {
        let session = self.session_read()?;
        Ok(session.payload()?.documents.clone())
    }

    /// Creates a document with the next free id and persists.
    pub fn add_document(&self, title: Option<&str>) -> VaultResult<Document> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let mut session = self.session_write()?;
        let (password, payload) = session.unlocked_mut()?;

        let doc = Document {
            id: payload.next_document_id(),
            version: 1,
            title,
            created_at: now_millis(),
            content: None,
            tags: Vec::new(),
        };
        payload.documents.push(doc.clone());
        self.persist(password, payload, "add_document")?;
        Ok(doc)
    }

    /// Replaces all fields of the document with the matching id.
    /// No-op (nothing persisted) when no such document exists.
    pub fn update_document(&self, updated: Document) -> VaultResult<()> {
        let mut session = self.session_write()?;
        let (password, payload) = session.unlocked_mut()?;

        if payload.document(updated.id).is_none() {
            return Ok(());
        }
        if let Some(doc) = payload.document_mut(updated.id) {
            *doc = updated;
        }
        self.persist(password, payload, "update_document")
    }

    /// Removes the document with the given id. No-op when absent.
    pub fn delete_document(&self, id: i64) -> VaultResult<()> {
        let mut session = self.session_write()?;
        let (password, payload) = session.unlocked_mut()?;

        let before = payload.documents.len();
        payload.documents.retain(|d| d.id != id);
        if payload.documents.len() == before {
            return Ok(());
        }
        self.persist(password, payload, "delete_document")
    }

    // ========================================================================
    // Attachments
    // ========================================================================

    pub fn list_attachments(&self) -> VaultResult<Vec<Attachment>> {
        let session = self.session_read()?;
        Ok(session.payload()?.uploads.clone())
    }

    /// Stores attachment bytes by value inside the vault payload, returning
    /// the created attachment with its inline data URL.
    pub fn add_attachment(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
    ) -> VaultResult<Attachment> {
        let attachment = Attachment {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size: bytes.len() as u64,
            created_at: now_millis(),
            data_url: notesafe_types::encode_data_url(mime_type, bytes),
        };

        let mut session = self.session_write()?;
        let (password, payload) = session.unlocked_mut()?;
        payload.uploads.push(attachment.clone());
        self.persist(password, payload, "add_attachment")?;
        Ok(attachment)
    }

    /// Removes the attachment with the given id. No-op when absent.
    pub fn delete_attachment(&self, id: &str) -> VaultResult<()> {
        let mut session = self.session_write()?;
        let (password, payload) = session.unlocked_mut()?;

        let before = payload.uploads.len();
        payload.uploads.retain(|u| u.id != id);
        if payload.uploads.len() == before {
            return Ok(());
        }
        self.persist(password, payload, "delete_attachment")
    }

    // ========================================================================
    // Debounced content saves
    // ========================================================================

    /// Schedules a debounced content save for a document.
    ///
    /// Edits to the same document within the quiet period coalesce; an edit
    /// to a *different* document flushes the previous pending save
    /// immediately so no document's edits are silently lost.
    pub fn save_content_debounced(&self, doc_id: i64, content: Value) -> VaultResult<()> {
        // Fail fast while locked rather than parking an unpersistable edit
        {
            let session = self.session_read()?;
            session.payload()?;
        }

        let displaced = self.saver_lock()?.schedule(doc_id, content);
        if let Some(pending) = displaced {
            self.apply_save(pending)?;
        }
        Ok(())
    }

    /// Persists the pending save regardless of its deadline. Called before
    /// export, password change and lock. Restore and replace instead *drop*
    /// the pending save: the edit belongs to the vault being replaced.
    pub fn flush_pending_saves(&self) -> VaultResult<()> {
        let pending = self.saver_lock()?.take_pending();
        if let Some(pending) = pending {
            self.apply_save(pending)?;
        }
        Ok(())
    }

    /// Persists the pending save if its quiet period has elapsed.
    pub fn flush_due_saves(&self) -> VaultResult<()> {
        let due = self.saver_lock()?.take_due(Instant::now());
        if let Some(pending) = due {
            self.apply_save(pending)?;
        }
        Ok(())
    }

    /// Time until the pending save comes due, `None` when nothing pends.
    pub fn next_save_due_in(&self) -> Option<Duration> {
        self.saver.lock().ok()?.due_in(Instant::now())
    }

    /// Sleeps until the pending save is due, then flushes it. Returns
    /// immediately when nothing is pending.
    pub async fn flush_when_due(&self) -> VaultResult<()> {
        let wait = self.saver_lock()?.due_in(Instant::now());
        let Some(wait) = wait else {
            return Ok(());
        };
        tokio::time::sleep(wait).await;
        self.flush_due_saves()
    }

    fn apply_save(&self, pending: PendingSave) -> VaultResult<()> {
        let PendingSave {
            doc_id, content, ..
        } = pending;

        let mut session = self.session_write()?;
        let (password, payload) = session.unlocked_mut()?;

        if let Some(doc) = payload.document_mut(doc_id) {
            doc.content = Some(content);
        } else {
            // Document was deleted while its save was pending
            debug!(doc_id, "dropped pending save for missing document");
            return Ok(());
        }
        self.persist(password, payload, "content_save")
    }

    // ========================================================================
    // Guard helpers: lock poisoning surfaces as a storage error
    // ========================================================================

    fn session_read(&self) -> VaultResult<RwLockReadGuard<'_, VaultSession>> {
        self.session
            .read()
            .map_err(|e| VaultError::Storage(e.to_string()))
    }

    fn session_write(&self) -> VaultResult<RwLockWriteGuard<'_, VaultSession>> {
        self.session
            .write()
            .map_err(|e| VaultError::Storage(e.to_string()))
    }

    fn saver_lock(&self) -> VaultResult<MutexGuard<'_, DebouncedSaver>> {
        self.saver
            .lock()
            .map_err(|e| VaultError::Storage(e.to_string()))
    }

    // ========================================================================
    // The single write path
    // ========================================================================

    /// Re-encrypts and persists the whole payload. Every durable write of
    /// protected data goes through here.
    fn persist(
        &self,
        password: &str,
        payload: &mut VaultPayload,
        op: &'static str,
    ) -> VaultResult<()> {
        payload.exported_at = now_millis();
        let record = encrypt_payload(password, payload)?;
        self.records.save(&record)?;
        debug!(op, documents = payload.documents.len(), "vault persisted");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn encrypt_payload(password: &str, payload: &VaultPayload) -> VaultResult<EncryptedRecord> {
    let bytes = serde_json::to_vec(payload).map_err(|e| VaultError::Storage(e.to_string()))?;
    Ok(encrypt(password, &bytes)?)
}

fn decrypt_payload(password: &str, record: &EncryptedRecord) -> VaultResult<VaultPayload> {
    let bytes = decrypt(password, record)?;
    // A payload that decrypts but fails to parse is a programming error or
    // version skew, not a user-facing condition
    serde_json::from_slice(&bytes)
        .map_err(|e| VaultError::Storage(format!("decrypted payload unreadable: {e}")))
}
