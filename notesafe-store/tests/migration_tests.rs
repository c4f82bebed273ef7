use std::sync::{Arc, Mutex};

use duckdb::Connection;
use notesafe_crypto::EncryptedRecord;
use notesafe_store::{
    DuckDbLegacyStore, DuckDbRecordStore, LegacyStore, RecordStore, VaultError, VaultResult,
    VaultStore,
};
use notesafe_types::Document;
use pretty_assertions::assert_eq;
use serde_json::json;

const PASSWORD: &str = "correct horse battery";

/// Store plus a seeding handle on its legacy backend.
fn store_with_legacy_handle() -> (VaultStore, Arc<DuckDbLegacyStore>) {
    let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
    let records = Arc::new(DuckDbRecordStore::open(conn.clone()).unwrap());
    let legacy = Arc::new(DuckDbLegacyStore::open(conn).unwrap());
    let store = VaultStore::with_stores(records, legacy.clone());
    (store, legacy)
}

fn seed_legacy(legacy: &DuckDbLegacyStore) {
    legacy
        .insert_document(&Document {
            id: 1,
            version: 1,
            title: "Old note".to_string(),
            created_at: 1_000,
            content: Some(json!({ "children": [{ "text": "from before" }] })),
            tags: vec!["archive".to_string()],
        })
        .unwrap();
    legacy
        .insert_document(&Document {
            id: 2,
            version: 1,
            title: "Older note".to_string(),
            created_at: 2_000,
            content: None,
            tags: vec![],
        })
        .unwrap();
    legacy
        .insert_attachment("att-1", "photo.png", "image/png", 3_000, b"\x89PNG")
        .unwrap();
}

#[test]
fn first_unlock_migrates_and_clears_legacy_store() {
    let (store, legacy) = store_with_legacy_handle();
    seed_legacy(&legacy);

    let payload = store.initialize_vault(PASSWORD).unwrap();

    assert_eq!(payload.documents.len(), 2);
    assert_eq!(payload.documents[0].title, "Old note");
    assert_eq!(payload.documents[0].tags, vec!["archive".to_string()]);
    assert_eq!(payload.uploads.len(), 1);
    assert_eq!(payload.uploads[0].id, "att-1");
    assert_eq!(payload.uploads[0].size, 4);
    assert!(payload.uploads[0].data_url.starts_with("data:image/png;base64,"));

    // The unprotected copy is gone
    let (docs, uploads) = legacy.read_all().unwrap();
    assert!(docs.is_empty());
    assert!(uploads.is_empty());
}

#[test]
fn migration_runs_only_once() {
    let (store, legacy) = store_with_legacy_handle();
    seed_legacy(&legacy);
    store.initialize_vault(PASSWORD).unwrap();
    store.lock();

    // Rows appearing after migration must never be picked up again
    legacy
        .insert_document(&Document {
            id: 99,
            version: 1,
            title: "Straggler".to_string(),
            created_at: 9_000,
            content: None,
            tags: vec![],
        })
        .unwrap();

    let payload = store.initialize_vault(PASSWORD).unwrap();
    assert_eq!(payload.documents.len(), 2);
    assert!(payload.documents.iter().all(|d| d.title != "Straggler"));

    // And the straggler row is left alone
    let (docs, _) = legacy.read_all().unwrap();
    assert_eq!(docs.len(), 1);
}

struct FailingRecordStore;

impl RecordStore for FailingRecordStore {
    fn load(&self) -> VaultResult<Option<EncryptedRecord>> {
        Ok(None)
    }
    fn save(&self, _record: &EncryptedRecord) -> VaultResult<()> {
        Err(VaultError::Storage("disk full".to_string()))
    }
    fn exists(&self) -> VaultResult<bool> {
        Ok(false)
    }
}

#[test]
fn legacy_store_survives_a_failed_migration_persist() {
    let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
    let legacy = Arc::new(DuckDbLegacyStore::open(conn).unwrap());
    seed_legacy(&legacy);

    let store = VaultStore::with_stores(Arc::new(FailingRecordStore), legacy.clone());

    let err = store.initialize_vault(PASSWORD).unwrap_err();
    assert!(matches!(err, VaultError::Storage(_)));
    assert!(!store.is_unlocked());

    // Nothing was destroyed: the migration clears legacy rows only after
    // the encrypted record has been durably written
    let (docs, uploads) = legacy.read_all().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(uploads.len(), 1);
}

#[test]
fn restore_clears_any_remaining_legacy_rows() {
    let (store, legacy) = store_with_legacy_handle();
    store.initialize_vault(PASSWORD).unwrap();
    let snapshot = store.encrypted_record_for_export().unwrap();

    // A legacy row written out of band after the vault already exists
    legacy
        .insert_document(&Document {
            id: 7,
            version: 1,
            title: "Leftover".to_string(),
            created_at: 5_000,
            content: None,
            tags: vec![],
        })
        .unwrap();

    store
        .restore_from_encrypted_record(PASSWORD, &snapshot)
        .unwrap();

    let (docs, uploads) = legacy.read_all().unwrap();
    assert!(docs.is_empty());
    assert!(uploads.is_empty());
}
