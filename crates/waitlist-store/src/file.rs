//! File-backed persistent store.

use crate::error::StoreError;
use crate::store::WaitlistStore;
use crate::types::{Ledger, Registrant};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// Snapshot format version.
const DATA_VERSION: u32 = 1;

/// On-disk snapshot of the waitlist.
#[derive(Debug, Serialize, Deserialize)]
struct WaitlistSnapshot {
    version: u32,
    registrants: Vec<Registrant>,
}

/// Registrant store persisted as a JSON snapshot.
///
/// Every insert rewrites the whole snapshot atomically (temp file + rename)
/// while the write lock is held, so `find` and `recent` wait on disk I/O for
/// the duration of an insert. Acceptable for a waitlist-sized collection.
///
/// The prepare, save and commit steps run on a spawned task. Dropping the
/// `insert` future does not interrupt them, so memory and disk always agree:
/// either both hold the new registrant or neither does.
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

struct FileStoreInner {
    ledger: RwLock<Ledger>,
    storage_path: PathBuf,
}

impl FileStore {
    /// Open the store, loading an existing snapshot if present.
    pub async fn open(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        let ledger = load(&storage_path).await?;

        info!(
            "Loaded waitlist with {} registrants from {:?}",
            ledger.len(),
            storage_path
        );

        Ok(Self {
            inner: Arc::new(FileStoreInner {
                ledger: RwLock::new(ledger),
                storage_path,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.storage_path
    }
}

impl FileStoreInner {
    async fn insert(&self, handle: &str) -> Result<Registrant, StoreError> {
        let mut ledger = self.ledger.write().await;
        let registrant = ledger
            .prepare(handle, Utc::now())
            .ok_or_else(|| StoreError::Duplicate(handle.to_string()))?;

        let mut registrants = ledger.entries().to_vec();
        registrants.push(registrant.clone());

        if let Err(e) = save(&self.storage_path, registrants).await {
            error!("Failed to persist waitlist, insert discarded: {}", e);
            return Err(e);
        }

        ledger.commit(registrant.clone());
        Ok(registrant)
    }
}

async fn load(path: &Path) -> Result<Ledger, StoreError> {
    if !path.exists() {
        info!("Waitlist file not found at {:?}, starting empty", path);
        return Ok(Ledger::default());
    }

    let data = fs::read(path).await?;
    let snapshot: WaitlistSnapshot = serde_json::from_slice(&data)?;

    if snapshot.version != DATA_VERSION {
        warn!(
            "Waitlist snapshot version {} differs from {}",
            snapshot.version, DATA_VERSION
        );
    }

    Ok(Ledger::from_entries(snapshot.registrants))
}

async fn save(path: &Path, registrants: Vec<Registrant>) -> Result<(), StoreError> {
    let snapshot = WaitlistSnapshot {
        version: DATA_VERSION,
        registrants,
    };
    let data = serde_json::to_vec_pretty(&snapshot)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &data).await?;
    fs::rename(&temp_path, path).await?;

    debug!("Saved waitlist ({} bytes) to {:?}", data.len(), path);
    Ok(())
}

#[async_trait]
impl WaitlistStore for FileStore {
    async fn find(&self, handle: &str) -> Result<Option<Registrant>, StoreError> {
        Ok(self.inner.ledger.read().await.get(handle).cloned())
    }

    #[instrument(skip(self))]
    async fn insert(&self, handle: &str) -> Result<Registrant, StoreError> {
        let inner = Arc::clone(&self.inner);
        let handle = handle.to_string();

        tokio::spawn(async move { inner.insert(&handle).await })
            .await
            .map_err(|e| StoreError::Unavailable(format!("Insert task failed: {}", e)))?
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Registrant>, StoreError> {
        Ok(self.inner.ledger.read().await.newest(limit))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.ledger.read().await.len())
    }
}
