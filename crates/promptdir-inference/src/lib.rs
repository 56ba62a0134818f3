//! # promptdir-inference
//!
//! Generation backends for the JSON prompt directory.
//!
//! This crate provides:
//! - Prompt flattening from JSON bodies and tag response parsing
//! - Gemini implementation of image and tag generation
//! - Mock backend for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use promptdir_core::ImageGenerationBackend;
//! use promptdir_inference::GeminiBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     if let Ok(Some(backend)) = GeminiBackend::from_env() {
//!         let image = backend.generate_image(r#"{"subject": "owl"}"#).await;
//!         println!("{:?}", image.map(|i| i.data.len()));
//!     }
//! }
//! ```

pub mod config;
pub mod gemini;
pub mod prompt;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{ConfigError, InferenceConfig};
pub use gemini::GeminiBackend;
pub use prompt::{image_prompt, parse_tags, prompt_text_from_body};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerationBackend;
