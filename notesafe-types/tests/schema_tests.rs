use notesafe_types::{encode_data_url, validate_payload, Attachment, Document, VaultPayload};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample_payload() -> VaultPayload {
    VaultPayload {
        version: 1,
        exported_at: 1_700_000_000_000,
        documents: vec![Document {
            id: 1,
            version: 2,
            title: "Quarterly Report".to_string(),
            created_at: 100,
            content: Some(json!({ "children": [{ "text": "numbers" }] })),
            tags: vec!["Work".to_string()],
        }],
        uploads: vec![Attachment {
            id: "a1".to_string(),
            name: "scan.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 3,
            created_at: 200,
            data_url: encode_data_url("image/png", &[1, 2, 3]),
        }],
    }
}

#[test]
fn wire_shape_uses_portable_field_names() {
    let value = serde_json::to_value(sample_payload()).unwrap();

    assert!(value.get("exportedAt").is_some());
    assert!(value["documents"][0].get("createdAt").is_some());
    assert_eq!(value["uploads"][0]["type"], json!("image/png"));
    assert!(value["uploads"][0].get("dataUrl").is_some());
    // Rust-side names must not leak onto the wire
    assert!(value["uploads"][0].get("mime_type").is_none());
    assert!(value.get("exported_at").is_none());
}

#[test]
fn payload_json_roundtrip() {
    let payload = sample_payload();
    let value = serde_json::to_value(&payload).unwrap();
    let back = validate_payload(&value).unwrap();
    assert_eq!(back, payload);
}

#[test]
fn absent_content_is_omitted_and_tolerated() {
    let doc = Document {
        id: 5,
        version: 1,
        title: "No body".to_string(),
        created_at: 0,
        content: None,
        tags: vec![],
    };
    let value = serde_json::to_value(&doc).unwrap();
    assert!(value.get("content").is_none());

    let back: Document = serde_json::from_value(value).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn validation_rejects_missing_and_mistyped_fields() {
    // Not an object
    assert!(validate_payload(&json!([])).is_err());

    // Missing documents array
    assert!(validate_payload(&json!({ "version": 1, "exportedAt": 0, "uploads": [] })).is_err());

    // Mistyped document id
    let bad = json!({
        "version": 1,
        "exportedAt": 0,
        "documents": [{ "id": "one", "version": 1, "title": "x", "createdAt": 0 }],
        "uploads": []
    });
    let err = validate_payload(&bad).unwrap_err();
    assert!(err.to_string().contains("id"));

    // Upload missing dataUrl
    let bad = json!({
        "version": 1,
        "exportedAt": 0,
        "documents": [],
        "uploads": [{ "id": "a", "name": "n", "type": "t", "size": 1, "createdAt": 0 }]
    });
    let err = validate_payload(&bad).unwrap_err();
    assert!(err.to_string().contains("dataUrl"));
}

#[test]
fn data_url_encoding() {
    assert_eq!(
        encode_data_url("text/plain", b"hi"),
        "data:text/plain;base64,aGk="
    );
}
