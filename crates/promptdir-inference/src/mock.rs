//! Mock generation backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promptdir_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new().with_tags(["owl", "night"]);
//! let tags = backend.generate_tags("{}").await;
//! assert_eq!(tags, vec!["owl", "night"]);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use promptdir_core::{
    Error, ImageGenerationBackend, InlineImage, Result, TagGenerationBackend,
};

use crate::prompt::fallback_tags;

/// Mock backend for image and tag generation.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    image: InlineImage,
    tags: Vec<String>,
    fail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            image: InlineImage {
                mime_type: "image/png".to_string(),
                data: vec![0x89, b'P', b'N', b'G'],
            },
            tags: vec!["mock".to_string()],
            fail: false,
        }
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Image returned by `generate_image`.
    pub fn with_image(mut self, image: InlineImage) -> Self {
        Arc::make_mut(&mut self.config).image = image;
        self
    }

    /// Tags returned by `generate_tags`.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.config).tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Make every call fail (tags fall back, images error).
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn log_call(&self, operation: &str, input: &str) {
        if let Ok(mut calls) = self.call_log.lock() {
            calls.push(MockCall {
                operation: operation.to_string(),
                input: input.to_string(),
            });
        }
    }
}

#[async_trait]
impl ImageGenerationBackend for MockGenerationBackend {
    async fn generate_image(&self, body: &str) -> Result<InlineImage> {
        self.log_call("generate_image", body);
        if self.config.fail {
            return Err(Error::Inference("mock generation failure".to_string()));
        }
        Ok(self.config.image.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl TagGenerationBackend for MockGenerationBackend {
    async fn generate_tags(&self, body: &str) -> Vec<String> {
        self.log_call("generate_tags", body);
        if self.config.fail {
            return fallback_tags();
        }
        self.config.tags.clone()
    }
}
