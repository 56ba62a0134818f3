//! Submission form state.

use tracing::{debug, warn};

use promptdir_core::defaults::DEFAULT_SUBMISSION_BODY;
use promptdir_core::{
    normalize_image_async, normalize_tags, ImageRef, Record, RecordDraft, Result,
    TagGenerationBackend,
};

use crate::pipeline::SubmissionPipeline;

/// Values carried into a fresh form, e.g. from a link or the workbench.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prefill {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image_ref: Option<ImageRef>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub tags: Vec<String>,
}

impl Prefill {
    /// Read prefill values from query-string style pairs.
    ///
    /// Recognized keys: `title`, `json`, `imageUrl`, `author`, `authorUrl`,
    /// `category` (one tag) and `tags` (comma separated). Unknown keys and
    /// empty values are ignored.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut prefill = Self::default();
        let mut tags = Vec::new();

        for (key, value) in pairs {
            let value = value.as_ref();
            if value.trim().is_empty() {
                continue;
            }
            match key.as_ref() {
                "title" => prefill.title = Some(value.to_string()),
                "json" => prefill.body = Some(value.to_string()),
                "author" => prefill.author = Some(value.to_string()),
                "authorUrl" => prefill.author_url = Some(value.to_string()),
                "imageUrl" => match ImageRef::parse(value) {
                    Ok(image_ref) => prefill.image_ref = Some(image_ref),
                    Err(e) => warn!(
                        subsystem = "submit",
                        component = "form",
                        error = %e,
                        "Ignoring unusable prefilled image"
                    ),
                },
                "category" => tags.push(value.to_string()),
                "tags" => tags.extend(value.split(',').map(str::to_string)),
                other => debug!(subsystem = "submit", component = "form", key = %other, "Ignoring unknown prefill key"),
            }
        }

        prefill.tags = normalize_tags(tags);
        prefill
    }
}

/// Editable form for publishing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionForm {
    pub title: String,
    pub author: String,
    pub author_url: String,
    pub tags: Vec<String>,
    pub body: String,
    pub image_ref: Option<ImageRef>,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            author_url: String::new(),
            tags: Vec::new(),
            body: DEFAULT_SUBMISSION_BODY.to_string(),
            image_ref: None,
        }
    }
}

impl SubmissionForm {
    pub fn from_prefill(prefill: Prefill) -> Self {
        let defaults = Self::default();
        Self {
            title: prefill.title.unwrap_or(defaults.title),
            author: prefill.author.unwrap_or(defaults.author),
            author_url: prefill.author_url.unwrap_or(defaults.author_url),
            tags: prefill.tags,
            body: prefill.body.unwrap_or(defaults.body),
            image_ref: prefill.image_ref,
        }
    }

    /// Normalize and attach an image. The previous image is kept on failure.
    pub async fn attach_image(&mut self, bytes: Vec<u8>) -> Result<()> {
        let image = normalize_image_async(bytes).await?;
        self.image_ref = Some(ImageRef::Inline(image));
        Ok(())
    }

    /// Replace tags from comma separated input.
    pub fn set_tags_from_input(&mut self, input: &str) {
        self.tags = normalize_tags(input.split(','));
    }

    /// Merge generated tag suggestions into the current tags.
    pub async fn suggest_tags(&mut self, backend: &dyn TagGenerationBackend) {
        let suggested = backend.generate_tags(&self.body).await;
        self.tags = normalize_tags(self.tags.iter().chain(suggested.iter()));
    }

    pub fn to_draft(&self) -> RecordDraft {
        let author_url = self.author_url.trim();
        RecordDraft {
            title: self.title.trim().to_string(),
            tags: self.tags.clone(),
            body: self.body.clone(),
            image_ref: self.image_ref.clone(),
            author: self.author.trim().to_string(),
            author_url: (!author_url.is_empty()).then(|| author_url.to_string()),
        }
    }

    /// Submit through `pipeline`. The form resets only on success.
    pub async fn submit(&mut self, pipeline: &SubmissionPipeline) -> Result<Record> {
        let record = pipeline.submit(&self.to_draft()).await?;
        *self = Self::default();
        Ok(record)
    }
}
