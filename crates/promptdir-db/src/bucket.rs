//! Remote object bucket for uploaded images.
//!
//! Speaks the storage REST API of a hosted backend: objects are uploaded with
//! a POST to `/storage/v1/object/{bucket}/{key}` and served publicly from
//! `/storage/v1/object/public/{bucket}/{key}`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use promptdir_core::{Error, ObjectStorage, RemoteConfig, Result};

/// Build the HTTP client shared by the remote table and bucket.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
}

/// Bucket client.
pub struct RemoteBucket {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl RemoteBucket {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }
}

#[async_trait]
impl ObjectStorage for RemoteBucket {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        let start = Instant::now();
        debug!(
            subsystem = "bucket",
            component = "remote_bucket",
            op = "upload",
            storage_key = %key,
            image_bytes = data.len(),
            "Uploading object"
        );

        let response = self
            .client
            .post(self.object_url(key))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| Error::Upload(format!("upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "bucket",
                component = "remote_bucket",
                op = "upload",
                storage_key = %key,
                status = status.as_u16(),
                "Upload rejected"
            );
            return Err(Error::Upload(format!(
                "bucket returned {}: {}",
                status, body
            )));
        }

        info!(
            subsystem = "bucket",
            component = "remote_bucket",
            op = "upload",
            storage_key = %key,
            image_bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Uploaded object"
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&ListRequest {
                prefix,
                limit,
                offset: 0,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "bucket list returned {}: {}",
                status, body
            )));
        }

        let entries: Vec<ListEntry> = response.json().await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }
}
