//! Mock storage backends for failure-path testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use nwc_storage::{KvStore, MemoryKvStore, StorageError, StorageResult};
use tokio::sync::Notify;

/// A store whose every operation fails with [`StorageError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingKvStore;

impl FailingKvStore {
    /// Create a failing store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn unavailable() -> StorageError {
    StorageError::Unavailable("store offline".to_string())
}

#[async_trait]
impl KvStore for FailingKvStore {
    async fn get(&self, _namespace: &str, _key: &str) -> StorageResult<Option<Vec<u8>>> {
        Err(unavailable())
    }

    async fn set(&self, _namespace: &str, _key: &str, _value: Vec<u8>) -> StorageResult<()> {
        Err(unavailable())
    }

    async fn delete(&self, _namespace: &str, _key: &str) -> StorageResult<bool> {
        Err(unavailable())
    }

    async fn list_keys(&self, _namespace: &str) -> StorageResult<Vec<String>> {
        Err(unavailable())
    }
}

/// An in-memory store that can be told to fail writes or deletes.
#[derive(Debug, Default)]
pub struct FlakyKvStore {
    inner: MemoryKvStore,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyKvStore {
    /// Create a healthy store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set` calls fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `delete` calls fail (or succeed again).
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for FlakyKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(namespace, key).await
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.set(namespace, key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.delete(namespace, key).await
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        self.inner.list_keys(namespace).await
    }
}

/// An in-memory store that parks writes and deletes of one key until told
/// to let them through.
///
/// Used to hold a connection's storage I/O open while checking what other
/// callers can still do.
#[derive(Debug, Default)]
pub struct GatedKvStore {
    inner: MemoryKvStore,
    gated: Mutex<Option<String>>,
    entered: Notify,
    release: Notify,
}

impl GatedKvStore {
    /// Create a store with no gate set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park every subsequent `set` or `delete` of `key` until [`release`](Self::release).
    pub fn gate(&self, key: &str) {
        *self.gated.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.to_string());
    }

    /// Resolve once an operation is parked at the gate.
    pub async fn parked(&self) {
        self.entered.notified().await;
    }

    /// Let one parked operation through and remove the gate.
    pub fn release(&self) {
        self.gated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.release.notify_one();
    }

    async fn pass(&self, key: &str) {
        let gated = self
            .gated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(key);
        if gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl KvStore for GatedKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(namespace, key).await
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.pass(key).await;
        self.inner.set(namespace, key, value).await
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        self.pass(key).await;
        self.inner.delete(namespace, key).await
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        self.inner.list_keys(namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_store_fails_everything() {
        let store = FailingKvStore::new();
        assert!(store.get("ns", "k").await.is_err());
        assert!(store.set("ns", "k", vec![]).await.is_err());
        assert!(store.list_keys("ns").await.is_err());
    }

    #[tokio::test]
    async fn test_flaky_store_toggles() {
        let store = FlakyKvStore::new();
        assert!(store.set("ns", "k", vec![1]).await.is_ok());
        store.fail_writes(true);
        assert!(store.set("ns", "k", vec![2]).await.is_err());
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(vec![1]));
        store.fail_writes(false);
        assert!(store.set("ns", "k", vec![3]).await.is_ok());
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_gated_store_parks_until_released() {
        let store = std::sync::Arc::new(GatedKvStore::new());
        store.gate("held");
        store.set("ns", "free", vec![1]).await.unwrap();

        let writer = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move { store.set("ns", "held", vec![2]).await })
        };
        store.parked().await;
        assert_eq!(store.get("ns", "held").await.unwrap(), None);

        store.release();
        writer.await.unwrap().unwrap();
        assert_eq!(store.get("ns", "held").await.unwrap(), Some(vec![2]));
    }
}
