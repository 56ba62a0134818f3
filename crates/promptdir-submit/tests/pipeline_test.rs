//! End-to-end submission scenarios over local and remote stores.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use promptdir_core::{
    ConnectivityStatus, Error, ImageRef, InlineImage, ObjectStorage, Record, RecordDraft, RecordStore,
    RemoteConfig, Result,
};
use promptdir_db::{LocalStore, MemoryBackend, RemoteBucket, RemoteStore, RemoteTable};
use promptdir_submit::{SubmissionForm, SubmissionPipeline, SubmissionState};
use serde_json::json;
use tokio::sync::{broadcast, Notify};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 160, 90]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn drain(rx: &mut broadcast::Receiver<SubmissionState>) -> Vec<SubmissionState> {
    let mut states = Vec::new();
    while let Ok(state) = rx.try_recv() {
        states.push(state);
    }
    states
}

async fn local_pipeline(backend: Arc<MemoryBackend>) -> SubmissionPipeline {
    let store = Arc::new(LocalStore::new(backend));
    store.load_all().await;
    SubmissionPipeline::new(store, None)
}

async fn filled_form() -> SubmissionForm {
    let mut form = SubmissionForm {
        title: "Tall Tower".to_string(),
        author: "Builder".to_string(),
        tags: vec!["architecture".to_string()],
        ..Default::default()
    };
    form.attach_image(png_bytes(500, 2000)).await.unwrap();
    form
}

#[tokio::test]
async fn test_local_submission_stores_normalized_inline_image() {
    let pipeline = local_pipeline(Arc::new(MemoryBackend::new())).await;
    let mut events = pipeline.subscribe();
    let mut form = filled_form().await;

    let record = form.submit(&pipeline).await.unwrap();

    assert!(record.id.as_str().starts_with("p-"));
    match &record.image_ref {
        ImageRef::Inline(image) => {
            assert_eq!(image.mime_type, "image/jpeg");
            assert_eq!(image.dimensions().unwrap(), (256, 1024));
        }
        other => panic!("expected inline image, got {:?}", other),
    }
    assert_eq!(pipeline.state(), SubmissionState::Succeeded);
    assert_eq!(
        drain(&mut events),
        vec![
            SubmissionState::Validating,
            SubmissionState::Persisting,
            SubmissionState::Succeeded
        ]
    );

    let reloaded = pipeline.store().load_all().await;
    assert_eq!(reloaded[0], record);
    assert_eq!(form, SubmissionForm::default());
}

#[tokio::test]
async fn test_empty_title_halts_in_validation() {
    let pipeline = local_pipeline(Arc::new(MemoryBackend::new())).await;
    let before = pipeline.store().records().await;
    let mut events = pipeline.subscribe();

    let mut form = filled_form().await;
    form.title = "   ".to_string();
    let snapshot = form.clone();

    let result = form.submit(&pipeline).await;
    assert!(matches!(result, Err(Error::Validation(msg)) if msg == "Title and Author are required."));
    assert_eq!(pipeline.state(), SubmissionState::Failed);
    assert_eq!(pipeline.failed_stage(), Some(SubmissionState::Validating));
    assert_eq!(
        drain(&mut events),
        vec![SubmissionState::Validating, SubmissionState::Failed]
    );
    assert_eq!(pipeline.store().records().await, before);
    assert_eq!(form, snapshot);
}

#[tokio::test]
async fn test_persist_failure_then_retry_with_same_draft() {
    let backend = Arc::new(MemoryBackend::new());
    let pipeline = local_pipeline(backend.clone()).await;
    let draft = filled_form().await.to_draft();

    backend.set_fail_writes(true);
    let result = pipeline.submit(&draft).await;
    assert!(matches!(result, Err(Error::Persistence(_))));
    assert_eq!(pipeline.state(), SubmissionState::Failed);
    assert_eq!(pipeline.failed_stage(), Some(SubmissionState::Persisting));
    assert_eq!(pipeline.store().records().await.len(), 3);

    backend.set_fail_writes(false);
    let record = pipeline.submit(&draft).await.unwrap();
    assert_eq!(record.title, "Tall Tower");
    assert_eq!(pipeline.state(), SubmissionState::Succeeded);
    assert_eq!(pipeline.failed_stage(), None);
}

// =============================================================================
// REMOTE
// =============================================================================

async fn remote_pipeline(server: &MockServer) -> SubmissionPipeline {
    let mut config = RemoteConfig::new(server.uri(), "anon-key");
    config.timeout_secs = 5;
    let bucket: Arc<dyn ObjectStorage> = Arc::new(RemoteBucket::new(&config).unwrap());
    let store = Arc::new(RemoteStore::new(
        RemoteTable::new(&config).unwrap(),
        bucket.clone(),
    ));
    store.load_all().await;
    SubmissionPipeline::new(store, Some(bucket))
}

async fn mount_empty_table(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/prompts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

async fn mount_probe(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/list/prompt-images"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_unreachable_remote_rejects_without_network_calls() {
    let server = MockServer::start().await;
    mount_empty_table(&server).await;
    mount_probe(&server, 500).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/prompt-images/.+"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/prompts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = remote_pipeline(&server).await;
    assert_eq!(pipeline.store().status(), ConnectivityStatus::Error);
    let requests_before = server.received_requests().await.unwrap().len();

    let draft = filled_form().await.to_draft();
    let result = pipeline.submit(&draft).await;
    assert!(matches!(result, Err(Error::RemoteUnavailable(_))));
    assert_eq!(pipeline.state(), SubmissionState::Failed);
    assert_eq!(pipeline.failed_stage(), Some(SubmissionState::Validating));
    assert_eq!(server.received_requests().await.unwrap().len(), requests_before);
}

#[tokio::test]
async fn test_connected_remote_uploads_then_persists_url() {
    let server = MockServer::start().await;
    mount_empty_table(&server).await;
    mount_probe(&server, 200).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/prompt-images/\d+-[a-z0-9]{8}\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    let stored_url = format!(
        "{}/storage/v1/object/public/prompt-images/1-abcdefgh.jpg",
        server.uri()
    );
    Mock::given(method("POST"))
        .and(path("/rest/v1/prompts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 11,
            "title": "Tall Tower",
            "tags": ["architecture"],
            "json": "{\n  \"style\": \"cinematic\"\n}",
            "image_url": stored_url,
            "author": "Builder",
            "author_url": null,
            "created_at": "2024-08-01T00:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = remote_pipeline(&server).await;
    assert_eq!(pipeline.store().status(), ConnectivityStatus::Connected);
    let mut events = pipeline.subscribe();

    let draft = filled_form().await.to_draft();
    let record = pipeline.submit(&draft).await.unwrap();
    assert_eq!(record.id.as_str(), "11");
    assert_eq!(record.image_ref, ImageRef::Url(stored_url));
    assert_eq!(
        drain(&mut events),
        vec![
            SubmissionState::Validating,
            SubmissionState::ImageUploading,
            SubmissionState::Persisting,
            SubmissionState::Succeeded
        ]
    );

    let requests = server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/rest/v1/prompts")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    let sent_url = body[0]["image_url"].as_str().unwrap();
    assert!(sent_url.starts_with(&format!(
        "{}/storage/v1/object/public/prompt-images/",
        server.uri()
    )));
    assert!(!sent_url.starts_with("data:"));
}

#[tokio::test]
async fn test_upload_failure_stops_before_persisting() {
    let server = MockServer::start().await;
    mount_empty_table(&server).await;
    mount_probe(&server, 200).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/prompt-images/.+"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/prompts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = remote_pipeline(&server).await;
    let draft = filled_form().await.to_draft();
    let result = pipeline.submit(&draft).await;
    assert!(matches!(result, Err(Error::Upload(_))));
    assert_eq!(pipeline.state(), SubmissionState::Failed);
    assert_eq!(pipeline.failed_stage(), Some(SubmissionState::ImageUploading));
}

#[tokio::test]
async fn test_unnormalized_png_uploads_with_png_key() {
    let server = MockServer::start().await;
    mount_empty_table(&server).await;
    mount_probe(&server, 200).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/prompt-images/\d+-[a-z0-9]{8}\.png$"))
        .and(header("Content-Type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/prompts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 12,
            "title": "Generated",
            "tags": [],
            "json": "{}",
            "image_url": "https://cdn.example/g.png",
            "author": "Bench",
            "author_url": null,
            "created_at": "2024-08-02T00:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = remote_pipeline(&server).await;
    let draft = RecordDraft {
        title: "Generated".to_string(),
        author: "Bench".to_string(),
        body: "{}".to_string(),
        image_ref: Some(ImageRef::Inline(InlineImage {
            mime_type: "image/png".to_string(),
            data: png_bytes(16, 16),
        })),
        ..Default::default()
    };
    let record = pipeline.submit(&draft).await.unwrap();
    assert_eq!(record.id.as_str(), "12");

    let requests = server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| r.url.path() == "/rest/v1/prompts" && r.method.as_str() == "POST")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert!(body[0]["image_url"].as_str().unwrap().ends_with(".png"));
}

// =============================================================================
// CONCURRENCY
// =============================================================================

/// Store whose insert waits until released.
struct GatedStore {
    inner: LocalStore,
    gate: Arc<Notify>,
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn load_all(&self) -> Vec<Record> {
        self.inner.load_all().await
    }

    async fn records(&self) -> Vec<Record> {
        self.inner.records().await
    }

    async fn insert(&self, draft: RecordDraft) -> Result<Record> {
        self.gate.notified().await;
        self.inner.insert(draft).await
    }

    async fn reset(&self) -> Result<()> {
        self.inner.reset().await
    }

    fn status(&self) -> ConnectivityStatus {
        self.inner.status()
    }

    fn backend_name(&self) -> &str {
        "gated"
    }
}

#[tokio::test]
async fn test_second_submit_while_active_is_refused() {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(GatedStore {
        inner: LocalStore::new(MemoryBackend::new()),
        gate: gate.clone(),
    });
    store.load_all().await;
    let pipeline = Arc::new(SubmissionPipeline::new(store, None));
    let mut events = pipeline.subscribe();

    let draft = filled_form().await.to_draft();
    let first = {
        let pipeline = pipeline.clone();
        let draft = draft.clone();
        tokio::spawn(async move { pipeline.submit(&draft).await })
    };

    while events.recv().await.unwrap() != SubmissionState::Persisting {}

    let second = pipeline.submit(&draft).await;
    assert!(matches!(second, Err(Error::SubmissionInProgress)));
    assert_eq!(pipeline.state(), SubmissionState::Persisting);

    gate.notify_one();
    let record = first.await.unwrap().unwrap();
    assert_eq!(pipeline.state(), SubmissionState::Succeeded);
    assert_eq!(pipeline.store().records().await[0], record);
    assert_eq!(pipeline.store().records().await.len(), 4);
}
