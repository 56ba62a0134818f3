//! Store configuration.
//!
//! The store variant is decided once from these settings: when both the
//! remote URL and key are present the directory runs against the remote
//! table and bucket, otherwise it keeps a local snapshot under `data_dir`.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | PROMPTDIR_DATA_DIR | .promptdir | Local snapshot directory |
//! | PROMPTDIR_REMOTE_URL | (unset) | Remote project base URL |
//! | PROMPTDIR_REMOTE_KEY | (unset) | Remote API key |
//! | PROMPTDIR_REMOTE_TABLE | prompts | Remote table name |
//! | PROMPTDIR_REMOTE_BUCKET | prompt-images | Remote bucket name |
//! | PROMPTDIR_REMOTE_TIMEOUT_SECS | 30 | Remote request timeout |

use std::path::PathBuf;

use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};

/// Remote table + bucket settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project base URL, without trailing slash.
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub bucket: String,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: defaults::REMOTE_TABLE.to_string(),
            bucket: defaults::REMOTE_BUCKET.to_string(),
            timeout_secs: defaults::REMOTE_TIMEOUT_SECS,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(Error::Config(format!(
                "remote url must start with http:// or https://, got: {}",
                self.url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("remote api key cannot be empty".to_string()));
        }
        if self.table.trim().is_empty() {
            return Err(Error::Config("remote table cannot be empty".to_string()));
        }
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("remote bucket cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Where records live for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            remote: None,
        }
    }
}

impl StoreConfig {
    /// Local-only configuration rooted at `data_dir`.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            remote: None,
        }
    }

    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = get(defaults::ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::DATA_DIR));

        let remote = match (get(defaults::ENV_REMOTE_URL), get(defaults::ENV_REMOTE_KEY)) {
            (Some(url), Some(key)) => {
                let mut remote = RemoteConfig::new(url, key);
                if let Some(table) = get(defaults::ENV_REMOTE_TABLE) {
                    remote.table = table;
                }
                if let Some(bucket) = get(defaults::ENV_REMOTE_BUCKET) {
                    remote.bucket = bucket;
                }
                if let Some(timeout) = get(defaults::ENV_REMOTE_TIMEOUT_SECS)
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    remote.timeout_secs = timeout;
                }
                Some(remote)
            }
            _ => None,
        };

        debug!(
            subsystem = "config",
            data_dir = %data_dir.display(),
            remote = remote.is_some(),
            "Loaded store configuration"
        );

        Self { data_dir, remote }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        Ok(())
    }
}
