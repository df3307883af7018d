//! Registration and recent-registrant queries over an injected store.

use super::validation::{validate, ValidHandle};
use crate::config::WaitlistConfig;
use crate::error::{RegistrationFailed, WaitlistError};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use waitlist_store::{Registrant, StoreError, WaitlistStore};

/// Result of a registration attempt that reached storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new registrant was created.
    Registered(Registrant),
    /// The handle was already on the waitlist. Nothing changed.
    AlreadyRegistered,
}

/// Waitlist registration service.
#[derive(Clone)]
pub struct WaitlistService {
    store: Arc<dyn WaitlistStore>,
    config: WaitlistConfig,
    read_failures: Arc<AtomicU64>,
}

impl WaitlistService {
    pub fn new(store: Arc<dyn WaitlistStore>, config: WaitlistConfig) -> Self {
        Self {
            store,
            config,
            read_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Validate a raw submitted field and register it.
    pub async fn join_waitlist(&self, raw: Option<&Value>) -> Result<Registrant, WaitlistError> {
        let handle = validate(raw).map_err(|e| {
            debug!(reason = ?e, "Rejected waitlist submission");
            e
        })?;

        match self.register(&handle).await? {
            RegisterOutcome::Registered(registrant) => Ok(registrant),
            RegisterOutcome::AlreadyRegistered => Err(WaitlistError::AlreadyRegistered),
        }
    }

    /// Register a validated handle.
    ///
    /// The store's uniqueness constraint decides; the lookup beforehand only
    /// short-circuits the common duplicate case.
    #[instrument(skip_all, fields(handle = %handle))]
    pub async fn register(
        &self,
        handle: &ValidHandle,
    ) -> Result<RegisterOutcome, RegistrationFailed> {
        let existing = self
            .with_timeout(self.store.find(handle.as_str()))
            .await
            .map_err(|e| {
                error!("Waitlist lookup failed: {}", e);
                RegistrationFailed(e)
            })?;

        if existing.is_some() {
            info!("Handle already on waitlist");
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        match self.with_timeout(self.store.insert(handle.as_str())).await {
            Ok(registrant) => {
                info!(sequence = registrant.sequence, "Joined waitlist");
                Ok(RegisterOutcome::Registered(registrant))
            }
            Err(StoreError::Duplicate(_)) => {
                info!("Handle already on waitlist (concurrent insert)");
                Ok(RegisterOutcome::AlreadyRegistered)
            }
            Err(e) => {
                error!("Waitlist insert failed: {}", e);
                Err(RegistrationFailed(e))
            }
        }
    }

    /// Most recent registrants, newest first.
    ///
    /// `None` uses the configured default. Limits above the configured
    /// maximum are clamped. Storage failures yield an empty list; they are
    /// logged and counted in [`WaitlistService::read_failures`].
    pub async fn recent(&self, limit: Option<usize>) -> Vec<Registrant> {
        let limit = limit
            .unwrap_or(self.config.recent_default_limit)
            .min(self.config.recent_max_limit);

        if limit == 0 {
            return Vec::new();
        }

        match self.with_timeout(self.store.recent(limit)).await {
            Ok(registrants) => registrants,
            Err(e) => {
                self.read_failures.fetch_add(1, Ordering::Relaxed);
                error!(limit, "Failed to fetch recent waitlist registrants: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of registrants, or `None` if storage is unreachable.
    pub async fn count(&self) -> Option<usize> {
        match self.with_timeout(self.store.count()).await {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Failed to count waitlist registrants: {}", e);
                None
            }
        }
    }

    /// Recent-query failures since startup.
    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::Relaxed)
    }

    async fn with_timeout<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let timeout = self.config.storage_timeout;
        tokio::time::timeout(timeout, op)
            .await
            .map_err(|_| StoreError::Unavailable(format!("timed out after {:?}", timeout)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waitlist::{validate_str, ValidationError};
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use serde_json::json;
    use std::time::Duration;
    use waitlist_store::{FileStore, MemoryStore};

    mock! {
        pub Store {}

        #[async_trait]
        impl WaitlistStore for Store {
            async fn find(&self, handle: &str) -> Result<Option<Registrant>, StoreError>;
            async fn insert(&self, handle: &str) -> Result<Registrant, StoreError>;
            async fn recent(&self, limit: usize) -> Result<Vec<Registrant>, StoreError>;
            async fn count(&self) -> Result<usize, StoreError>;
        }
    }

    /// Store that never answers.
    struct StalledStore;

    #[async_trait]
    impl WaitlistStore for StalledStore {
        async fn find(&self, _handle: &str) -> Result<Option<Registrant>, StoreError> {
            std::future::pending().await
        }

        async fn insert(&self, _handle: &str) -> Result<Registrant, StoreError> {
            std::future::pending().await
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<Registrant>, StoreError> {
            std::future::pending().await
        }

        async fn count(&self) -> Result<usize, StoreError> {
            std::future::pending().await
        }
    }

    fn service_with(store: impl WaitlistStore + 'static) -> WaitlistService {
        WaitlistService::new(Arc::new(store), WaitlistConfig::default())
    }

    fn registrant(handle: &str, sequence: u64) -> Registrant {
        Registrant {
            handle: handle.into(),
            registered_at: Utc::now(),
            sequence,
        }
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let service = service_with(MemoryStore::new());
        let handle = validate_str("a@example.com").unwrap();

        let first = service.register(&handle).await.unwrap();
        assert!(matches!(first, RegisterOutcome::Registered(ref r) if r.handle == "a@example.com"));

        let second = service.register(&handle).await.unwrap();
        assert_eq!(second, RegisterOutcome::AlreadyRegistered);
        assert_eq!(service.count().await, Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_register_same_handle() {
        let service = service_with(MemoryStore::new());
        let handle = validate_str("a@example.com").unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let service = service.clone();
                let handle = handle.clone();
                tokio::spawn(async move { service.register(&handle).await })
            })
            .collect();

        let outcomes: Vec<_> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let registered = outcomes
            .iter()
            .filter(|o| matches!(o, RegisterOutcome::Registered(_)))
            .count();
        assert_eq!(registered, 1);
        assert_eq!(outcomes.len() - registered, 49);
        assert_eq!(service.count().await, Some(1));
    }

    #[tokio::test]
    async fn test_insert_race_maps_to_already_registered() {
        let mut store = MockStore::new();
        store.expect_find().returning(|_| Ok(None));
        store
            .expect_insert()
            .returning(|h| Err(StoreError::Duplicate(h.to_string())));

        let service = service_with(store);
        let handle = validate_str("a@example.com").unwrap();

        let outcome = service.register(&handle).await.unwrap();
        assert_eq!(outcome, RegisterOutcome::AlreadyRegistered);
    }

    #[tokio::test]
    async fn test_storage_failure_is_registration_failed() {
        let mut store = MockStore::new();
        store.expect_find().returning(|_| Ok(None));
        store
            .expect_insert()
            .returning(|_| Err(StoreError::Unavailable("disk full".into())));

        let service = service_with(store);
        let err = service
            .join_waitlist(Some(&json!("a@example.com")))
            .await
            .unwrap_err();

        assert!(matches!(err, WaitlistError::RegistrationFailed(_)));
        assert_eq!(err.to_string(), "Failed to join waitlist");
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_insert() {
        let mut store = MockStore::new();
        store
            .expect_find()
            .returning(|_| Err(StoreError::Unavailable("connection reset".into())));
        store.expect_insert().never();

        let service = service_with(store);
        let handle = validate_str("a@example.com").unwrap();

        assert!(service.register(&handle).await.is_err());
    }

    #[tokio::test]
    async fn test_validation_failure_never_touches_store() {
        let mut store = MockStore::new();
        store.expect_find().never();
        store.expect_insert().never();

        let service = service_with(store);

        let err = service.join_waitlist(None).await.unwrap_err();
        assert!(matches!(err, WaitlistError::Validation(ValidationError::MissingField)));

        let err = service.join_waitlist(Some(&json!(""))).await.unwrap_err();
        assert!(matches!(err, WaitlistError::Validation(ValidationError::InvalidFormat)));
    }

    #[tokio::test]
    async fn test_recent_returns_newest_first() {
        let service = service_with(MemoryStore::new());
        for i in 1..=7 {
            let handle = validate_str(&format!("user{}@example.com", i)).unwrap();
            service.register(&handle).await.unwrap();
        }

        let recent = service.recent(Some(5)).await;
        let handles: Vec<_> = recent.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(
            handles,
            vec![
                "user7@example.com",
                "user6@example.com",
                "user5@example.com",
                "user4@example.com",
                "user3@example.com",
            ]
        );
    }

    #[tokio::test]
    async fn test_recent_default_and_clamp() {
        let mut store = MockStore::new();
        store
            .expect_recent()
            .withf(|&limit| limit == 5)
            .times(1)
            .returning(|_| Ok(vec![registrant("a@example.com", 1)]));
        store
            .expect_recent()
            .withf(|&limit| limit == 50)
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let service = service_with(store);

        assert_eq!(service.recent(None).await.len(), 1);
        assert!(service.recent(Some(10_000)).await.is_empty());
    }

    #[tokio::test]
    async fn test_recent_zero_limit_skips_store() {
        let mut store = MockStore::new();
        store.expect_recent().never();

        let service = service_with(store);
        assert!(service.recent(Some(0)).await.is_empty());
    }

    #[tokio::test]
    async fn test_recent_failure_is_empty_and_counted() {
        let mut store = MockStore::new();
        store
            .expect_recent()
            .returning(|_| Err(StoreError::Unavailable("connection refused".into())));

        let service = service_with(store);
        assert_eq!(service.read_failures(), 0);

        assert!(service.recent(Some(5)).await.is_empty());
        assert!(service.recent(Some(5)).await.is_empty());
        assert_eq!(service.read_failures(), 2);
    }

    #[tokio::test]
    async fn test_timeouts() {
        let config = WaitlistConfig {
            storage_timeout: Duration::from_millis(20),
            ..WaitlistConfig::default()
        };
        let service = WaitlistService::new(Arc::new(StalledStore), config);
        let handle = validate_str("a@example.com").unwrap();

        let err = service.register(&handle).await.unwrap_err();
        assert!(matches!(err.0, StoreError::Unavailable(_)));

        assert!(service.recent(Some(5)).await.is_empty());
        assert_eq!(service.read_failures(), 1);
        assert_eq!(service.count().await, None);
    }

    #[tokio::test]
    async fn test_abandoned_register_leaves_file_store_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waitlist.json");
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let service = WaitlistService::new(store.clone(), WaitlistConfig::default());

        for i in 0..20 {
            let handle = validate_str(&format!("user{}@example.com", i)).unwrap();
            let service = service.clone();
            let task = tokio::spawn(async move { service.register(&handle).await });
            // Give the insert a chance to start before cancelling it.
            tokio::time::sleep(Duration::from_micros(200 * i)).await;
            task.abort();
        }

        // Let any in-flight writes finish.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let reopened = FileStore::open(&path).await.unwrap();
        let in_memory = store.recent(50).await.unwrap();
        let on_disk = reopened.recent(50).await.unwrap();
        assert_eq!(in_memory, on_disk);
    }
}
