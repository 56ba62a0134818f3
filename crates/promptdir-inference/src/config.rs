//! Generation backend configuration.
//!
//! Loaded from environment variables. Generation is optional: without an API
//! key [`InferenceConfig::from_env`] returns `None` and the surfaces that need
//! it report generation as unavailable.
//!
//! | Variable | Default |
//! |----------|---------|
//! | GEMINI_API_KEY (or API_KEY) | (unset) |
//! | GEMINI_BASE_URL | https://generativelanguage.googleapis.com |
//! | GEMINI_IMAGE_MODEL | gemini-2.5-flash-image |
//! | GEMINI_TEXT_MODEL | gemini-2.5-flash |
//! | PROMPTDIR_GEN_TIMEOUT_SECS | 120 |

use promptdir_core::defaults;
use thiserror::Error;
use tracing::debug;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_IMAGE_MODEL: &str = "GEMINI_IMAGE_MODEL";
pub const ENV_TEXT_MODEL: &str = "GEMINI_TEXT_MODEL";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for the hosted generation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_key: String,
    pub image_model: String,
    pub text_model: String,
    pub timeout_secs: u64,
}

impl InferenceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: defaults::GEMINI_URL.to_string(),
            api_key: api_key.into(),
            image_model: defaults::IMAGE_MODEL.to_string(),
            text_model: defaults::TEXT_MODEL.to_string(),
            timeout_secs: defaults::GEN_TIMEOUT_SECS,
        }
    }

    /// Load from environment variables. `None` when no API key is set.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY).or_else(|| get(ENV_API_KEY_FALLBACK))?;
        let mut config = Self::new(api_key);
        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get(ENV_IMAGE_MODEL) {
            config.image_model = model;
        }
        if let Some(model) = get(ENV_TEXT_MODEL) {
            config.text_model = model;
        }
        if let Some(timeout) =
            get(defaults::ENV_GEN_TIMEOUT_SECS).and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout_secs = timeout;
        }

        debug!(
            subsystem = "config",
            base_url = %config.base_url,
            image_model = %config.image_model,
            text_model = %config.text_model,
            "Loaded inference configuration"
        );
        Some(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api_key cannot be empty".to_string(),
            ));
        }
        if self.image_model.is_empty() || self.text_model.is_empty() {
            return Err(ConfigError::Validation(
                "model names cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
