//! Submission pipeline.
//!
//! Drives one draft through validation, optional image upload and
//! persistence:
//!
//! ```text
//! Idle -> Validating -> (ImageUploading) -> Persisting -> Succeeded
//!             \               \                 \-------> Failed
//! ```
//!
//! A failed attempt remembers the stage it failed in ([`SubmissionPipeline::failed_stage`]).
//! Only one attempt runs at a time. A second `submit` while one is active is
//! refused without touching the state; a finished attempt (succeeded or
//! failed) can always be followed by a new one.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use promptdir_core::defaults::UPLOAD_EXTENSION;
use promptdir_core::{
    ConnectivityStatus, Error, ImageRef, InlineImage, ObjectStorage, Record, RecordDraft,
    RecordStore, Result,
};

const EVENT_CAPACITY: usize = 16;
const UPLOAD_KEY_SUFFIX_LEN: usize = 8;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    ImageUploading,
    Persisting,
    Succeeded,
    Failed,
}

impl SubmissionState {
    /// Whether an attempt is in flight.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Validating | Self::ImageUploading | Self::Persisting
        )
    }
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::ImageUploading => "image_uploading",
            Self::Persisting => "persisting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Check a draft's required fields.
///
/// Checks run in a fixed order and the first failure wins: image, then
/// title and author, then the JSON body.
pub fn validate_draft(draft: &RecordDraft) -> Result<()> {
    if draft.image_ref.is_none() {
        return Err(Error::Validation("Please upload an image.".to_string()));
    }
    if draft.title.trim().is_empty() || draft.author.trim().is_empty() {
        return Err(Error::Validation(
            "Title and Author are required.".to_string(),
        ));
    }
    if serde_json::from_str::<serde_json::Value>(&draft.body).is_err() {
        return Err(Error::Validation("Invalid JSON.".to_string()));
    }
    Ok(())
}

/// Bucket key for a new upload: `{unix_millis}-{8 random alphanumerics}.{extension}`.
pub fn upload_key(extension: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UPLOAD_KEY_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

/// Content type and key extension for an inline image, trusting the bytes
/// over the label. Unrecognised bytes keep the declared type and `jpg`.
fn upload_format(image: &InlineImage) -> (String, &'static str) {
    match infer::get(&image.data) {
        Some(kind) if kind.mime_type().starts_with("image/") => {
            if kind.mime_type() != image.mime_type {
                debug!(
                    subsystem = "submit",
                    component = "pipeline",
                    declared = %image.mime_type,
                    detected = kind.mime_type(),
                    "Inline image MIME differs from its bytes"
                );
            }
            (kind.mime_type().to_string(), kind.extension())
        }
        _ => (image.mime_type.clone(), UPLOAD_EXTENSION),
    }
}

struct Progress {
    state: SubmissionState,
    /// Stage the last attempt was in when it failed.
    failed_stage: Option<SubmissionState>,
}

/// Sequential submission state machine over a store and optional bucket.
pub struct SubmissionPipeline {
    store: Arc<dyn RecordStore>,
    bucket: Option<Arc<dyn ObjectStorage>>,
    progress: Mutex<Progress>,
    events: broadcast::Sender<SubmissionState>,
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn RecordStore>, bucket: Option<Arc<dyn ObjectStorage>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            bucket,
            progress: Mutex::new(Progress {
                state: SubmissionState::Idle,
                failed_stage: None,
            }),
            events,
        }
    }

    fn progress(&self) -> std::sync::MutexGuard<'_, Progress> {
        match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SubmissionState {
        self.progress().state
    }

    /// The stage (`Validating`, `ImageUploading` or `Persisting`) the last
    /// attempt failed in. `None` unless the state is `Failed`.
    pub fn failed_stage(&self) -> Option<SubmissionState> {
        self.progress().failed_stage
    }

    /// Receive every state transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionState> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    fn transition(&self, next: SubmissionState) {
        let previous = {
            let mut progress = self.progress();
            let previous = std::mem::replace(&mut progress.state, next);
            if next == SubmissionState::Failed {
                progress.failed_stage = Some(previous);
            }
            previous
        };
        debug!(
            subsystem = "submit",
            component = "pipeline",
            from = %previous,
            to = %next,
            "Submission state transition"
        );
        // No subscribers is fine.
        let _ = self.events.send(next);
    }

    /// Claim the pipeline for a new attempt, moving it to `Validating`.
    fn begin(&self) -> Result<()> {
        {
            let mut progress = self.progress();
            if progress.state.is_active() {
                return Err(Error::SubmissionInProgress);
            }
            progress.state = SubmissionState::Validating;
            progress.failed_stage = None;
        }
        debug!(
            subsystem = "submit",
            component = "pipeline",
            to = %SubmissionState::Validating,
            "Submission state transition"
        );
        let _ = self.events.send(SubmissionState::Validating);
        Ok(())
    }

    /// Run one submission attempt.
    ///
    /// The draft is only borrowed so a failed attempt can be retried as is.
    pub async fn submit(&self, draft: &RecordDraft) -> Result<Record> {
        self.begin()?;
        let start = Instant::now();

        match self.run(draft).await {
            Ok(record) => {
                self.transition(SubmissionState::Succeeded);
                info!(
                    subsystem = "submit",
                    component = "pipeline",
                    op = "submit",
                    record_id = %record.id,
                    backend = self.store.backend_name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Submission succeeded"
                );
                Ok(record)
            }
            Err(e) => {
                self.transition(SubmissionState::Failed);
                warn!(
                    subsystem = "submit",
                    component = "pipeline",
                    op = "submit",
                    backend = self.store.backend_name(),
                    stage = ?self.failed_stage(),
                    error = %e,
                    "Submission failed"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, draft: &RecordDraft) -> Result<Record> {
        validate_draft(draft)?;

        let status = self.store.status();
        if status == ConnectivityStatus::Error {
            return Err(Error::RemoteUnavailable(
                "the directory backend is unreachable; submissions are disabled".to_string(),
            ));
        }

        let mut draft = draft.clone();
        if status == ConnectivityStatus::Connected {
            if let Some(ImageRef::Inline(image)) = &draft.image_ref {
                match &self.bucket {
                    Some(bucket) => {
                        self.transition(SubmissionState::ImageUploading);
                        let url = self.upload_image(bucket.as_ref(), image).await?;
                        draft = draft.with_image_ref(ImageRef::Url(url));
                    }
                    None => debug!(
                        subsystem = "submit",
                        component = "pipeline",
                        "No bucket configured, storing image inline"
                    ),
                }
            }
        }

        self.transition(SubmissionState::Persisting);
        self.store.insert(draft).await
    }

    async fn upload_image(&self, bucket: &dyn ObjectStorage, image: &InlineImage) -> Result<String> {
        let (content_type, extension) = upload_format(image);
        let key = upload_key(extension);
        bucket
            .upload(&key, &image.data, &content_type)
            .await
            .map_err(|e| match e {
                Error::Upload(msg) => Error::Upload(msg),
                other => Error::Upload(other.to_string()),
            })?;
        Ok(bucket.public_url(&key))
    }
}
