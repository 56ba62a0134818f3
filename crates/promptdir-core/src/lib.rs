//! # promptdir-core
//!
//! Core types, traits, and abstractions for the JSON prompt directory.
//!
//! This crate provides the record model, the error taxonomy, the storage and
//! generation traits implemented by the other crates, and the two pieces of
//! pure logic every surface needs: the directory filter and the image
//! normalizer.

pub mod config;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod image;
pub mod logging;
pub mod models;
pub mod seed;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{RemoteConfig, StoreConfig};
pub use error::{Error, Result};
pub use filter::{available_tags, filter_records, find_record, normalize_tags};
pub use crate::image::{normalize_image, normalize_image_async, scaled_dimensions, InlineImage};
pub use models::*;
pub use seed::seed_records;
pub use traits::*;
