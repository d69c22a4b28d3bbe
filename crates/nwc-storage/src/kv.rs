//! The key-value store trait and its in-memory backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// Namespaced byte storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Remove a value. Returns whether it existed.
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// All keys in a namespace, sorted.
    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;

    /// Whether a key exists.
    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.get(namespace, key).await?.is_some())
    }
}

pub(crate) fn validate_key(namespace: &str, key: &str) -> StorageResult<()> {
    if namespace.is_empty() {
        return Err(StorageError::InvalidKey("empty namespace".to_string()));
    }
    if key.is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "empty key in namespace {namespace}"
        )));
    }
    Ok(())
}

/// In-memory store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(namespace, key)?;
        let data = self.data.read().await;
        Ok(data.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate_key(namespace, key)?;
        let mut data = self.data.write().await;
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        validate_key(namespace, key)?;
        let mut data = self.data.write().await;
        Ok(data
            .get_mut(namespace)
            .is_some_and(|ns| ns.remove(key).is_some()))
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        let data = self.data.read().await;
        Ok(data
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("ns", "a").await.unwrap(), None);

        store.set("ns", "a", vec![1, 2]).await.unwrap();
        assert_eq!(store.get("ns", "a").await.unwrap(), Some(vec![1, 2]));
        assert!(store.exists("ns", "a").await.unwrap());

        store.set("ns", "a", vec![3]).await.unwrap();
        assert_eq!(store.get("ns", "a").await.unwrap(), Some(vec![3]));

        assert!(store.delete("ns", "a").await.unwrap());
        assert!(!store.delete("ns", "a").await.unwrap());
        assert!(!store.exists("ns", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = MemoryKvStore::new();
        store.set("one", "k", vec![1]).await.unwrap();
        store.set("two", "k", vec![2]).await.unwrap();
        assert_eq!(store.get("one", "k").await.unwrap(), Some(vec![1]));
        assert_eq!(store.list_keys("two").await.unwrap(), vec!["k"]);
        assert!(store.list_keys("three").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_sorted() {
        let store = MemoryKvStore::new();
        for key in ["c", "a", "b"] {
            store.set("ns", key, Vec::new()).await.unwrap();
        }
        assert_eq!(store.list_keys("ns").await.unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = MemoryKvStore::new();
        assert!(matches!(
            store.set("ns", "", vec![]).await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("", "k").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
