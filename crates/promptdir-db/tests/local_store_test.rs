//! Local store persistence across sessions on a real filesystem.

use promptdir_core::defaults::SNAPSHOT_KEY;
use promptdir_core::{
    seed_records, ConnectivityStatus, ImageRef, InlineImage, RecordDraft, RecordStore,
    StoreConfig,
};
use promptdir_db::{open_store, FilesystemBackend, LocalStore};

fn draft(title: &str, image_ref: ImageRef) -> RecordDraft {
    RecordDraft {
        title: title.to_string(),
        tags: vec!["local".to_string()],
        body: "{\n  \"style\": \"cinematic\"\n}".to_string(),
        image_ref: Some(image_ref),
        author: "Author".to_string(),
        author_url: Some("https://example.com".to_string()),
    }
}

#[tokio::test]
async fn test_first_session_shows_seed() {
    let dir = tempfile::tempdir().unwrap();
    let handle = open_store(&StoreConfig::local(dir.path())).await.unwrap();

    assert_eq!(handle.store.backend_name(), "local");
    assert_eq!(handle.store.status(), ConnectivityStatus::Local);
    assert!(handle.bucket.is_none());
    assert_eq!(handle.store.records().await, seed_records());
}

#[tokio::test]
async fn test_inserted_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::local(dir.path());

    let handle = open_store(&config).await.unwrap();
    let inline = ImageRef::Inline(InlineImage {
        mime_type: "image/jpeg".to_string(),
        data: vec![0xFF, 0xD8, 0xFF, 0xE0],
    });
    let first = handle.store.insert(draft("Inline", inline)).await.unwrap();
    let second = handle
        .store
        .insert(draft(
            "Linked",
            ImageRef::Url("https://cdn.example/a.jpg".to_string()),
        ))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    drop(handle);

    let reopened = open_store(&config).await.unwrap();
    let records = reopened.store.records().await;
    assert_eq!(records.len(), 5);
    assert_eq!(records[0], second);
    assert_eq!(records[1], first);
    assert!(records[1].image_ref.is_inline());
    assert!(dir.path().join(SNAPSHOT_KEY).exists());
}

#[tokio::test]
async fn test_snapshot_uses_camel_case_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(FilesystemBackend::new(dir.path()));
    store.load_all().await;
    store
        .insert(draft(
            "Keys",
            ImageRef::Url("https://cdn.example/k.jpg".to_string()),
        ))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join(SNAPSHOT_KEY)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &value[0];
    assert_eq!(first["title"], "Keys");
    assert_eq!(first["imageUrl"], "https://cdn.example/k.jpg");
    assert_eq!(first["authorUrl"], "https://example.com");
    assert!(first["createdAt"].is_string());
    assert!(first["json"].is_string());
}

#[tokio::test]
async fn test_corrupt_snapshot_on_disk_falls_back_to_seed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(SNAPSHOT_KEY), b"\x00\x01 not json").unwrap();

    let handle = open_store(&StoreConfig::local(dir.path())).await.unwrap();
    assert_eq!(handle.store.records().await, seed_records());
}
