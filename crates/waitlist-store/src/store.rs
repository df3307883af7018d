//! Storage seam and the in-memory backend.

use crate::error::StoreError;
use crate::types::{Ledger, Registrant};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Durable collection of registrants keyed by a unique handle.
///
/// `insert` is the only mutation. It must enforce handle uniqueness
/// atomically and report a collision as [`StoreError::Duplicate`].
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Look up a registrant by exact handle.
    async fn find(&self, handle: &str) -> Result<Option<Registrant>, StoreError>;

    /// Insert a new registrant, stamping `registered_at` and `sequence`.
    async fn insert(&self, handle: &str) -> Result<Registrant, StoreError>;

    /// Up to `limit` registrants, most recently registered first.
    async fn recent(&self, limit: usize) -> Result<Vec<Registrant>, StoreError>;

    /// Number of registrants.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// In-memory registrant store.
///
/// Nothing survives a restart. Useful for development and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("In-memory waitlist store initialized");
        Self::default()
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn find(&self, handle: &str) -> Result<Option<Registrant>, StoreError> {
        Ok(self.ledger.read().await.get(handle).cloned())
    }

    #[instrument(skip(self))]
    async fn insert(&self, handle: &str) -> Result<Registrant, StoreError> {
        let mut ledger = self.ledger.write().await;
        let registrant = ledger
            .append(handle, Utc::now())
            .ok_or_else(|| StoreError::Duplicate(handle.to_string()))?;

        debug!(sequence = registrant.sequence, "Registrant inserted");
        Ok(registrant)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Registrant>, StoreError> {
        Ok(self.ledger.read().await.newest(limit))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.ledger.read().await.len())
    }
}
