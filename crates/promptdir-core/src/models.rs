//! Data models for the prompt directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::InlineImage;

// =============================================================================
// RECORD TYPES
// =============================================================================

/// Opaque record identifier assigned by the store.
///
/// Local ids look like `p-1718000000000-k3x9qz`; remote ids are whatever the
/// backend hands back, kept in string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a record's image lives.
///
/// Serialized as a single string: a `data:` URL for inline images, the URL
/// itself otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageRef {
    /// Self-contained encoded image.
    Inline(InlineImage),
    /// Remote image reachable by URL.
    Url(String),
}

impl ImageRef {
    /// Parse a stored reference. `data:` URLs become inline images.
    pub fn parse(value: &str) -> crate::Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(crate::Error::Validation(
                "image reference is empty".to_string(),
            ));
        }
        if value.starts_with("data:") {
            Ok(Self::Inline(InlineImage::parse_data_url(value)?))
        } else {
            Ok(Self::Url(value.to_string()))
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// String form used for persistence and display.
    pub fn to_reference_string(&self) -> String {
        match self {
            Self::Inline(image) => image.to_data_url(),
            Self::Url(url) => url.clone(),
        }
    }
}

impl TryFrom<String> for ImageRef {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        value.to_reference_string()
    }
}

/// One persisted prompt entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// JSON prompt body, stored verbatim.
    #[serde(rename = "json")]
    pub body: String,
    #[serde(rename = "imageUrl")]
    pub image_ref: ImageRef,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Assemble a record from a draft plus store-assigned identity.
    ///
    /// Fails when the draft carries no image.
    pub fn from_draft(
        draft: RecordDraft,
        id: RecordId,
        created_at: DateTime<Utc>,
    ) -> crate::Result<Self> {
        let image_ref = draft
            .image_ref
            .ok_or_else(|| crate::Error::Validation("Please upload an image.".to_string()))?;
        Ok(Self {
            id,
            title: draft.title,
            tags: draft.tags,
            body: draft.body,
            image_ref,
            author: draft.author,
            author_url: draft.author_url,
            created_at,
        })
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A record's fields before the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub title: String,
    pub tags: Vec<String>,
    pub body: String,
    pub image_ref: Option<ImageRef>,
    pub author: String,
    pub author_url: Option<String>,
}

impl RecordDraft {
    /// Copy of this draft with a different image reference.
    pub fn with_image_ref(&self, image_ref: ImageRef) -> Self {
        Self {
            image_ref: Some(image_ref),
            ..self.clone()
        }
    }
}

/// Sort a collection newest-first by `created_at`. Stable for equal timestamps.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// =============================================================================
// STORE STATUS
// =============================================================================

/// Whether the remote backend is configured and reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    /// Remote reachable and in use.
    Connected,
    /// No remote configured.
    Local,
    /// Remote configured but unreachable or misconfigured.
    Error,
}

impl std::fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Local => write!(f, "local"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for ConnectivityStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "connected" => Ok(Self::Connected),
            "local" => Ok(Self::Local),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid connectivity status: {}", s)),
        }
    }
}
