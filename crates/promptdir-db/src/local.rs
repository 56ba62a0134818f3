//! Local snapshot store.
//!
//! The whole collection is serialized under one key after every mutation.
//! A missing or unreadable snapshot falls back to the seed collection.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use promptdir_core::defaults::{LOCAL_ID_PREFIX, SNAPSHOT_KEY};
use promptdir_core::{
    seed_records, sort_newest_first, ConnectivityStatus, Error, Record, RecordDraft, RecordId,
    RecordStore, Result,
};

use crate::storage::StorageBackend;

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 6;

/// Generate a local record id that does not collide with `existing`.
///
/// Ids look like `p-1718000000000-k3x9qa`: creation millis plus a short random
/// suffix so two inserts in the same millisecond still differ.
pub fn generate_local_id(existing: &[Record]) -> RecordId {
    let mut rng = rand::thread_rng();
    loop {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
            .collect();
        let candidate = RecordId::new(format!(
            "{}{}-{}",
            LOCAL_ID_PREFIX,
            Utc::now().timestamp_millis(),
            suffix
        ));
        if !existing.iter().any(|r| r.id == candidate) {
            return candidate;
        }
    }
}

/// Record store persisted as a single snapshot in a [`StorageBackend`].
pub struct LocalStore {
    backend: Box<dyn StorageBackend>,
    records: Mutex<Vec<Record>>,
}

impl LocalStore {
    /// Create a store over `backend`. The collection is empty until
    /// [`RecordStore::load_all`] runs.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            records: Mutex::new(Vec::new()),
        }
    }

    async fn read_snapshot(&self) -> Option<Vec<Record>> {
        match self.backend.exists(SNAPSHOT_KEY).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    subsystem = "store",
                    component = "local_store",
                    storage_key = SNAPSHOT_KEY,
                    "No snapshot present, using seed"
                );
                return None;
            }
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "local_store",
                    error = %e,
                    "Snapshot existence check failed, using seed"
                );
                return None;
            }
        }

        let bytes = match self.backend.read(SNAPSHOT_KEY).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "local_store",
                    storage_key = SNAPSHOT_KEY,
                    error = %e,
                    "Snapshot read failed, using seed"
                );
                return None;
            }
        };

        match serde_json::from_slice::<Vec<Record>>(&bytes) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(
                    subsystem = "store",
                    component = "local_store",
                    storage_key = SNAPSHOT_KEY,
                    error = %e,
                    "Snapshot unparsable, using seed"
                );
                None
            }
        }
    }

    async fn persist(&self, records: &[Record]) -> Result<()> {
        let bytes = serde_json::to_vec(records)?;
        self.backend.write(SNAPSHOT_KEY, &bytes).await
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn load_all(&self) -> Vec<Record> {
        let start = Instant::now();
        let mut guard = self.records.lock().await;

        let mut records = self.read_snapshot().await.unwrap_or_else(seed_records);
        sort_newest_first(&mut records);
        *guard = records.clone();

        info!(
            subsystem = "store",
            component = "local_store",
            op = "load_all",
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Loaded local collection"
        );
        records
    }

    async fn records(&self) -> Vec<Record> {
        self.records.lock().await.clone()
    }

    async fn insert(&self, draft: RecordDraft) -> Result<Record> {
        let mut guard = self.records.lock().await;

        let id = generate_local_id(&guard);
        let record = Record::from_draft(draft, id, Utc::now())?;

        let mut updated = Vec::with_capacity(guard.len() + 1);
        updated.push(record.clone());
        updated.extend(guard.iter().cloned());

        // In-memory collection only changes once the snapshot is durable.
        self.persist(&updated).await.map_err(|e| {
            warn!(
                subsystem = "store",
                component = "local_store",
                op = "insert",
                error = %e,
                "Snapshot write failed"
            );
            Error::Persistence(format!("could not save locally: {}", e))
        })?;
        *guard = updated;

        info!(
            subsystem = "store",
            component = "local_store",
            op = "insert",
            record_id = %record.id,
            result_count = guard.len(),
            "Inserted record"
        );
        Ok(record)
    }

    async fn reset(&self) -> Result<()> {
        let mut guard = self.records.lock().await;
        self.backend
            .delete(SNAPSHOT_KEY)
            .await
            .map_err(|e| Error::Persistence(format!("could not clear snapshot: {}", e)))?;
        *guard = seed_records();

        info!(
            subsystem = "store",
            component = "local_store",
            op = "reset",
            result_count = guard.len(),
            "Reset local collection to seed"
        );
        Ok(())
    }

    fn status(&self) -> ConnectivityStatus {
        ConnectivityStatus::Local
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}
