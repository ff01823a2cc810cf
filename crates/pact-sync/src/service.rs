//! Sync service - load, merge, persist under exclusive access

use crate::error::SyncResult;
use pact_core::{merge, Record};
use pact_store::{LoadOutcome, RecordStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Reconciles client-submitted collections against the durable store.
///
/// The store is the only shared mutable resource, and it is guarded
/// end-to-end: the internal mutex is held across the whole
/// load-merge-persist sequence. Guarding only the write would let two
/// overlapping calls each load stale state and the second commit
/// silently discard the first's updates.
pub struct SyncService {
    store: Arc<dyn RecordStore>,
    /// Serializes complete sync calls; store mutations are totally ordered
    lock: Mutex<()>,
}

impl SyncService {
    /// Create a sync service owning a handle to the given store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Execute one sync call and return the fully merged collection.
    ///
    /// A missing or corrupt store degrades to the empty collection: the
    /// store is a derived cache reconstructible from client syncs, so
    /// availability wins over strict failure on the read side. A failed
    /// commit fails the whole call; nothing is returned unless it was
    /// durably persisted.
    pub async fn sync(&self, client: Vec<Record>) -> SyncResult<Vec<Record>> {
        let _guard = self.lock.lock().await;

        let server = match self.store.load_all().await {
            Ok(LoadOutcome::Records(records)) => records,
            Ok(LoadOutcome::Missing) => {
                debug!("No store yet, starting from empty collection");
                Vec::new()
            }
            Ok(LoadOutcome::Corrupt { detail }) => {
                warn!(detail = %detail, "Store unreadable, rebuilding from client syncs");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Store read failed, rebuilding from client syncs");
                Vec::new()
            }
        };

        let submitted = client.len();
        let merged = merge(server, client);
        self.store.replace_all(&merged).await?;

        info!(submitted, total = merged.len(), "Sync committed");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pact_store::{MemoryStore, StoreError};
    use serde_json::json;

    fn record(id: &str, logs: &[&str]) -> Record {
        let mut r = Record::new(id);
        r.logs = logs.iter().map(|s| s.to_string()).collect();
        r
    }

    /// Store double whose reads succeed but whose commits always fail
    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn load_all(&self) -> Result<LoadOutcome, StoreError> {
            Ok(LoadOutcome::Missing)
        }

        async fn replace_all(&self, _records: &[Record]) -> Result<(), StoreError> {
            Err(StoreError::Io("device full".into()))
        }
    }

    /// Store double reporting a corrupt resource
    struct CorruptStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RecordStore for CorruptStore {
        async fn load_all(&self) -> Result<LoadOutcome, StoreError> {
            Ok(LoadOutcome::Corrupt {
                detail: "truncated".into(),
            })
        }

        async fn replace_all(&self, records: &[Record]) -> Result<(), StoreError> {
            self.inner.replace_all(records).await
        }
    }

    async fn stored(store: &dyn RecordStore) -> Vec<Record> {
        match store.load_all().await.unwrap() {
            LoadOutcome::Records(records) => records,
            other => panic!("expected records, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_sync_creates_store() {
        let store = Arc::new(MemoryStore::new());
        let service = SyncService::new(store.clone());

        let client = vec![record("a", &["x"]), record("b", &[])];
        let merged = service.sync(client.clone()).await.unwrap();

        assert_eq!(merged, client);
        assert_eq!(stored(store.as_ref()).await, client);
    }

    #[tokio::test]
    async fn test_returns_full_server_state() {
        let store = Arc::new(MemoryStore::new());
        store
            .replace_all(&[record("server-only", &["s"])])
            .await
            .unwrap();
        let service = SyncService::new(store);

        let merged = service.sync(vec![record("a", &["x"])]).await.unwrap();

        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["server-only", "a"]);
    }

    #[tokio::test]
    async fn test_repeated_sync_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let service = SyncService::new(store);

        let mut goal = record("a", &["y", "x"]);
        goal.failure_logs = vec!["e1".into()];
        goal.fields.insert("name".into(), json!("Alicia"));
        let client = vec![goal, record("b", &["z"])];

        let first = service.sync(client.clone()).await.unwrap();
        let second = service.sync(client).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces() {
        let service = SyncService::new(Arc::new(FailingStore));

        let result = service.sync(vec![record("a", &["x"])]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_store_degrades_to_empty() {
        let service = SyncService::new(Arc::new(CorruptStore {
            inner: MemoryStore::new(),
        }));

        let merged = service.sync(vec![record("a", &["x"])]).await.unwrap();
        assert_eq!(merged, vec![record("a", &["x"])]);
    }

    #[tokio::test]
    async fn test_overlapping_syncs_lose_no_updates() {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(SyncService::new(store.clone()));

        let s1 = service.clone();
        let s2 = service.clone();
        let (r1, r2) = tokio::join!(
            s1.sync(vec![record("a", &["from-one"])]),
            s2.sync(vec![record("a", &["from-two"])]),
        );
        r1.unwrap();
        r2.unwrap();

        let final_store = stored(store.as_ref()).await;
        assert_eq!(final_store.len(), 1);
        let logs = &final_store[0].logs;
        assert!(logs.contains(&"from-one".to_string()));
        assert!(logs.contains(&"from-two".to_string()));
    }
}
