//! Core traits for the prompt directory.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::image::InlineImage;
use crate::models::*;

// =============================================================================
// RECORD STORE
// =============================================================================

/// Session-owned record collection backed by local or remote persistence.
///
/// Implementations own the in-memory collection and serialize every mutation
/// of it. Readers always receive a complete snapshot.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reload the collection from the backend, newest-first.
    ///
    /// Never fails: when nothing usable can be read the seed collection is
    /// returned and the failure is reflected in [`RecordStore::status`].
    async fn load_all(&self) -> Vec<Record>;

    /// Current in-memory collection, newest-first. No I/O.
    async fn records(&self) -> Vec<Record>;

    /// Create a record from a draft and prepend it to the collection.
    async fn insert(&self, draft: RecordDraft) -> Result<Record>;

    /// Bulk reset of the whole collection.
    async fn reset(&self) -> Result<()>;

    /// Connectivity of the backing store.
    fn status(&self) -> ConnectivityStatus;

    /// Short backend name for logs ("local", "remote").
    fn backend_name(&self) -> &str;
}

// =============================================================================
// OBJECT STORAGE
// =============================================================================

/// Bucket holding uploaded images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload bytes under `key`.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Public URL for an uploaded key.
    fn public_url(&self, key: &str) -> String;

    /// List keys under `prefix`. Used as a connectivity probe.
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

// =============================================================================
// GENERATION TRAITS
// =============================================================================

/// Backend that renders an image from a JSON prompt body.
#[async_trait]
pub trait ImageGenerationBackend: Send + Sync {
    /// Generate one image for the given body.
    async fn generate_image(&self, body: &str) -> Result<InlineImage>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend that suggests descriptive tags for a JSON prompt body.
#[async_trait]
pub trait TagGenerationBackend: Send + Sync {
    /// Up to five lowercased tags; the fixed fallback pair on failure.
    async fn generate_tags(&self, body: &str) -> Vec<String>;
}
