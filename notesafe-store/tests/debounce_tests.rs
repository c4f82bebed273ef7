use std::time::Duration;

use notesafe_store::{VaultError, VaultStore, QUIET_PERIOD};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const PASSWORD: &str = "correct horse battery";

fn unlocked_store() -> VaultStore {
    let store = VaultStore::open_in_memory().unwrap();
    store.initialize_vault(PASSWORD).unwrap();
    store
}

fn content_of(store: &VaultStore, doc_id: i64) -> Option<Value> {
    store
        .list_documents()
        .unwrap()
        .into_iter()
        .find(|d| d.id == doc_id)
        .unwrap()
        .content
}

#[tokio::test(start_paused = true)]
async fn content_save_applies_after_the_quiet_period() {
    let store = unlocked_store();
    let doc = store.add_document(Some("Journal")).unwrap();

    store
        .save_content_debounced(doc.id, json!({ "children": [{ "text": "first" }] }))
        .unwrap();

    // Nothing persisted yet
    store.flush_due_saves().unwrap();
    assert_eq!(content_of(&store, doc.id), None);
    assert_eq!(store.next_save_due_in(), Some(QUIET_PERIOD));

    store.flush_when_due().await.unwrap();
    assert_eq!(
        content_of(&store, doc.id),
        Some(json!({ "children": [{ "text": "first" }] }))
    );
    assert!(store.next_save_due_in().is_none());
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_coalesce_into_the_latest_content() {
    let store = unlocked_store();
    let doc = store.add_document(Some("Journal")).unwrap();

    store.save_content_debounced(doc.id, json!("draft one")).unwrap();
    tokio::time::advance(Duration::from_millis(400)).await;
    store.save_content_debounced(doc.id, json!("draft two")).unwrap();

    // 400ms + 200ms is past the first deadline but not the restarted one
    tokio::time::advance(Duration::from_millis(200)).await;
    store.flush_due_saves().unwrap();
    assert_eq!(content_of(&store, doc.id), None);

    tokio::time::advance(Duration::from_millis(300)).await;
    store.flush_due_saves().unwrap();
    assert_eq!(content_of(&store, doc.id), Some(json!("draft two")));
}

#[tokio::test(start_paused = true)]
async fn switching_documents_persists_the_previous_edit_immediately() {
    let store = unlocked_store();
    let first = store.add_document(Some("First")).unwrap();
    let second = store.add_document(Some("Second")).unwrap();

    store
        .save_content_debounced(first.id, json!("first doc edit"))
        .unwrap();
    store
        .save_content_debounced(second.id, json!("second doc edit"))
        .unwrap();

    // The first document's edit was displaced and applied at once
    assert_eq!(content_of(&store, first.id), Some(json!("first doc edit")));
    // The second is still waiting out its quiet period
    assert_eq!(content_of(&store, second.id), None);

    store.flush_when_due().await.unwrap();
    assert_eq!(content_of(&store, second.id), Some(json!("second doc edit")));
}

#[tokio::test(start_paused = true)]
async fn locking_flushes_the_pending_save() {
    let store = unlocked_store();
    let doc = store.add_document(Some("Journal")).unwrap();

    store
        .save_content_debounced(doc.id, json!("about to lock"))
        .unwrap();
    store.lock();

    let payload = store.initialize_vault(PASSWORD).unwrap();
    assert_eq!(
        payload.documents[0].content,
        Some(json!("about to lock"))
    );
}

#[tokio::test(start_paused = true)]
async fn export_flushes_the_pending_save() {
    let store = unlocked_store();
    let doc = store.add_document(Some("Journal")).unwrap();
    let before = store.encrypted_record_for_export().unwrap();

    store
        .save_content_debounced(doc.id, json!("must be exported"))
        .unwrap();
    let after = store.encrypted_record_for_export().unwrap();

    // The export reflects the flushed edit, so the record must have changed
    assert_ne!(before, after);
    assert_eq!(content_of(&store, doc.id), Some(json!("must be exported")));
}

#[tokio::test(start_paused = true)]
async fn restore_discards_the_pending_edit() {
    let store = unlocked_store();
    let doc = store.add_document(Some("Journal")).unwrap();
    let snapshot = store.encrypted_record_for_export().unwrap();

    store
        .save_content_debounced(doc.id, json!("belongs to the old vault"))
        .unwrap();
    store
        .restore_from_encrypted_record(PASSWORD, &snapshot)
        .unwrap();

    // The pre-restore edit must not land in the restored vault
    store.flush_when_due().await.unwrap();
    assert_eq!(content_of(&store, doc.id), None);
    assert!(store.next_save_due_in().is_none());
}

#[tokio::test(start_paused = true)]
async fn pending_save_for_a_deleted_document_is_dropped() {
    let store = unlocked_store();
    let doc = store.add_document(Some("Doomed")).unwrap();
    let survivor = store.add_document(Some("Survivor")).unwrap();

    store
        .save_content_debounced(doc.id, json!("never lands"))
        .unwrap();
    store.delete_document(doc.id).unwrap();

    store.flush_when_due().await.unwrap();
    assert_eq!(store.list_documents().unwrap().len(), 1);
    assert_eq!(content_of(&store, survivor.id), None);
}

#[tokio::test(start_paused = true)]
async fn save_while_locked_fails_fast() {
    let store = VaultStore::open_in_memory().unwrap();
    assert!(matches!(
        store.save_content_debounced(1, json!("edit")),
        Err(VaultError::Locked)
    ));
    assert!(store.next_save_due_in().is_none());
}
