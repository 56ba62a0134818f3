//! # promptdir-db
//!
//! Persistence for the JSON prompt directory.
//!
//! Two store variants implement [`promptdir_core::RecordStore`]:
//!
//! - [`LocalStore`] keeps the collection as one JSON snapshot on disk.
//! - [`RemoteStore`] reads and writes a hosted table and pairs it with a
//!   [`RemoteBucket`] for uploaded images.
//!
//! [`open_store`] picks the variant from a [`StoreConfig`] and performs the
//! initial load.

pub mod bucket;
pub mod local;
pub mod remote;
pub mod storage;

use std::sync::Arc;

use tracing::{info, warn};

use promptdir_core::{ObjectStorage, RecordStore, Result, StoreConfig};

pub use bucket::RemoteBucket;
pub use local::{generate_local_id, LocalStore};
pub use remote::{NewPromptRow, PromptRow, RemoteStore, RemoteTable};
pub use storage::{FilesystemBackend, MemoryBackend, StorageBackend};

/// An opened, loaded store plus the bucket to upload into, if any.
#[derive(Clone)]
pub struct StoreHandle {
    pub store: Arc<dyn RecordStore>,
    pub bucket: Option<Arc<dyn ObjectStorage>>,
}

/// Open the store described by `config` and load its collection.
///
/// Load failures do not fail the open: the store falls back to the seed
/// collection and reports the problem through its status.
pub async fn open_store(config: &StoreConfig) -> Result<StoreHandle> {
    config.validate()?;

    let handle = match &config.remote {
        Some(remote) => {
            let bucket: Arc<dyn ObjectStorage> = Arc::new(RemoteBucket::new(remote)?);
            let table = RemoteTable::new(remote)?;
            StoreHandle {
                store: Arc::new(RemoteStore::new(table, bucket.clone())),
                bucket: Some(bucket),
            }
        }
        None => {
            let backend = FilesystemBackend::new(&config.data_dir);
            if let Err(e) = backend.validate().await {
                warn!(
                    subsystem = "store",
                    component = "local_store",
                    data_dir = %config.data_dir.display(),
                    error = %e,
                    "Data directory not writable; submissions will fail"
                );
            }
            StoreHandle {
                store: Arc::new(LocalStore::new(backend)),
                bucket: None,
            }
        }
    };

    let records = handle.store.load_all().await;
    info!(
        subsystem = "store",
        backend = handle.store.backend_name(),
        status = %handle.store.status(),
        result_count = records.len(),
        "Store opened"
    );
    Ok(handle)
}
