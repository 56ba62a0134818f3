//! Error types for the prompt directory.

use thiserror::Error;

/// Result type alias using the directory's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for directory operations.
///
/// The first five variants are the user-facing taxonomy: every failed
/// submission or degraded store maps onto one of them.
#[derive(Error, Debug)]
pub enum Error {
    /// User-correctable input defect (missing title, invalid JSON body, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uploaded file could not be decoded as an image
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Remote bucket upload failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Record could not be persisted
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Remote backend is configured but unreachable or misconfigured
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Another submission is already running on this pipeline
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the user can fix this by editing the submission form.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::ImageDecode(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::ImageDecode(e.to_string())
    }
}
