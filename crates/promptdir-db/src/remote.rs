//! Remote table store.
//!
//! Records live in a hosted table reachable over a PostgREST-style API. The
//! store keeps an in-memory copy of the last successful fetch and tracks
//! connectivity: any failed fetch or bucket probe flips the status to
//! [`ConnectivityStatus::Error`], which blocks further inserts until the next
//! successful reload.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use promptdir_core::{
    seed_records, sort_newest_first, ConnectivityStatus, Error, ImageRef, ObjectStorage, Record,
    RecordDraft, RecordId, RecordStore, RemoteConfig, Result,
};

use crate::bucket::build_client;

// =============================================================================
// ROW MAPPING
// =============================================================================

/// A row as returned by the remote table.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRow {
    /// Numeric or textual depending on the table definition.
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub json: String,
    pub image_url: String,
    pub author: String,
    #[serde(default)]
    pub author_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PromptRow {
    pub fn into_record(self) -> Result<Record> {
        let id = match self.id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(Error::Serialization(format!(
                    "unsupported row id: {}",
                    other
                )))
            }
        };
        Ok(Record {
            id: RecordId::new(id),
            title: self.title,
            tags: self.tags.unwrap_or_default(),
            body: self.json,
            image_ref: ImageRef::parse(&self.image_url)?,
            author: self.author,
            author_url: self.author_url.filter(|u| !u.trim().is_empty()),
            created_at: self.created_at,
        })
    }
}

/// Insert payload. The table assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPromptRow {
    pub title: String,
    pub tags: Vec<String>,
    pub json: String,
    pub image_url: String,
    pub author: String,
    pub author_url: Option<String>,
}

impl NewPromptRow {
    pub fn from_draft(draft: &RecordDraft) -> Result<Self> {
        let image_ref = draft
            .image_ref
            .as_ref()
            .ok_or_else(|| Error::Validation("Please upload an image.".to_string()))?;
        Ok(Self {
            title: draft.title.clone(),
            tags: draft.tags.clone(),
            json: draft.body.clone(),
            image_url: image_ref.to_reference_string(),
            author: draft.author.clone(),
            author_url: draft.author_url.clone(),
        })
    }
}

/// Convert fetched rows, skipping rows that cannot be represented.
fn rows_to_records(rows: Vec<PromptRow>) -> Vec<Record> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.to_string();
            match row.into_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        subsystem = "store",
                        component = "remote_store",
                        record_id = %id,
                        error = %e,
                        "Skipping malformed row"
                    );
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// TABLE CLIENT
// =============================================================================

/// Thin client for the remote table.
pub struct RemoteTable {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RemoteTable {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// All rows, newest-first.
    pub async fn select_all(&self) -> Result<Vec<PromptRow>> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "table query returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Insert one row and return it as stored.
    pub async fn insert(&self, row: &NewPromptRow) -> Result<PromptRow> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "table insert returned {}: {}",
                status, body
            )));
        }

        let mut rows: Vec<PromptRow> = response.json().await?;
        if rows.is_empty() {
            return Err(Error::Request(
                "table insert returned no rows".to_string(),
            ));
        }
        Ok(rows.swap_remove(0))
    }
}

// =============================================================================
// STORE
// =============================================================================

/// In-memory copy of the remote collection.
#[derive(Default)]
struct Collection {
    records: Vec<Record>,
    /// The records are the seed placeholder, not rows from the table.
    showing_seed: bool,
}

impl Collection {
    /// Merge a freshly inserted row.
    ///
    /// Seed ids share the table's numbering but never name table rows, so
    /// the placeholder is replaced outright rather than merged by id.
    fn merge_inserted(&mut self, record: Record) {
        if self.showing_seed {
            self.records = vec![record];
            self.showing_seed = false;
        } else {
            self.records.retain(|r| r.id != record.id);
            self.records.insert(0, record);
        }
    }
}

/// Record store backed by the remote table, probing the bucket for health.
pub struct RemoteStore {
    table: RemoteTable,
    bucket: Arc<dyn ObjectStorage>,
    collection: Mutex<Collection>,
    status: RwLock<ConnectivityStatus>,
}

impl RemoteStore {
    /// Status starts as `Error` until the first successful load.
    pub fn new(table: RemoteTable, bucket: Arc<dyn ObjectStorage>) -> Self {
        Self {
            table,
            bucket,
            collection: Mutex::new(Collection::default()),
            status: RwLock::new(ConnectivityStatus::Error),
        }
    }

    fn set_status(&self, status: ConnectivityStatus) {
        match self.status.write() {
            Ok(mut guard) => *guard = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    async fn load_all(&self) -> Vec<Record> {
        let start = Instant::now();
        let mut guard = self.collection.lock().await;

        let (mut records, showing_seed, status) = match self.table.select_all().await {
            Ok(rows) => {
                let mut records = rows_to_records(rows);
                let showing_seed = records.is_empty();
                if showing_seed {
                    debug!(
                        subsystem = "store",
                        component = "remote_store",
                        op = "load_all",
                        "Remote table empty, showing seed"
                    );
                    records = seed_records();
                }
                let status = match self.bucket.list("", 1).await {
                    Ok(_) => ConnectivityStatus::Connected,
                    Err(e) => {
                        warn!(
                            subsystem = "store",
                            component = "remote_store",
                            op = "load_all",
                            error = %e,
                            "Bucket probe failed"
                        );
                        ConnectivityStatus::Error
                    }
                };
                (records, showing_seed, status)
            }
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "remote_store",
                    op = "load_all",
                    error = %e,
                    "Remote query failed, showing seed"
                );
                (seed_records(), true, ConnectivityStatus::Error)
            }
        };

        sort_newest_first(&mut records);
        *guard = Collection {
            records: records.clone(),
            showing_seed,
        };
        self.set_status(status);

        info!(
            subsystem = "store",
            component = "remote_store",
            op = "load_all",
            status = %status,
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Loaded remote collection"
        );
        records
    }

    async fn records(&self) -> Vec<Record> {
        self.collection.lock().await.records.clone()
    }

    async fn insert(&self, draft: RecordDraft) -> Result<Record> {
        if self.status() == ConnectivityStatus::Error {
            return Err(Error::RemoteUnavailable(
                "remote store is unreachable; reload before submitting".to_string(),
            ));
        }
        let row = NewPromptRow::from_draft(&draft)?;

        let mut guard = self.collection.lock().await;
        let inserted = self.table.insert(&row).await.map_err(|e| {
            warn!(
                subsystem = "store",
                component = "remote_store",
                op = "insert",
                error = %e,
                "Remote insert failed"
            );
            Error::Persistence(e.to_string())
        })?;
        let record = inserted
            .into_record()
            .map_err(|e| Error::Persistence(format!("unexpected row from remote: {}", e)))?;

        guard.merge_inserted(record.clone());

        info!(
            subsystem = "store",
            component = "remote_store",
            op = "insert",
            record_id = %record.id,
            result_count = guard.records.len(),
            "Inserted record"
        );
        Ok(record)
    }

    /// Remote collections are never wiped from here; reset re-fetches.
    async fn reset(&self) -> Result<()> {
        self.load_all().await;
        Ok(())
    }

    fn status(&self) -> ConnectivityStatus {
        match self.status.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn backend_name(&self) -> &str {
        "remote"
    }
}
