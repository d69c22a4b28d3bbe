//! File-backed key-value store.
//!
//! Layout: `{root}/{hex(namespace)}/{hex(key)}`. Writes go to a temporary
//! sibling and are renamed into place, so a reader sees either the old or the
//! new value, never a torn one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::kv::{KvStore, validate_key};

const TMP_SUFFIX: &str = ".tmp";

/// A [`KvStore`] persisted under a directory.
#[derive(Debug)]
pub struct FileKvStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileKvStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened file store");
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(hex::encode(namespace))
    }

    fn key_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace).join(hex::encode(key))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(namespace, key)?;
        match tokio::fs::read(self.key_path(namespace, key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate_key(namespace, key)?;
        let dir = self.namespace_dir(namespace);
        tokio::fs::create_dir_all(&dir).await?;

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!("{}.{n}{TMP_SUFFIX}", hex::encode(key)));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&value).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, self.key_path(namespace, key)).await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        validate_key(namespace, key)?;
        match tokio::fs::remove_file(self.key_path(namespace, key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(self.namespace_dir(namespace)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.ends_with(TMP_SUFFIX) {
                continue;
            }
            let key = hex::decode(name)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .ok_or_else(|| {
                    StorageError::Internal(format!("unexpected file in store: {name}"))
                })?;
            keys.push(key);
        }
        keys.sort();
        Ok(keys)
    }
}
