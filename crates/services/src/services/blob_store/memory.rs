//! In-memory blob store for tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BlobError, BlobStore, DEFAULT_CONTAINER};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Keeps objects in a map and hands out `memory://{container}/{key}` URLs.
///
/// Clones share the same storage, so a test can keep a handle while the
/// service owns another.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    container: String,
    objects: Arc<RwLock<HashMap<String, StoredBlob>>>,
    container_ready: Arc<AtomicBool>,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_container(DEFAULT_CONTAINER)
    }

    pub fn with_container(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            container_ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoredBlob> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Whether `ensure_container` has been called.
    pub fn container_ready(&self) -> bool {
        self.container_ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn ensure_container(&self) -> Result<(), BlobError> {
        self.container_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BlobError> {
        if !self.container_ready() {
            return Err(BlobError::Upload {
                key: key.to_string(),
                message: format!("container {} does not exist", self.container),
            });
        }

        self.objects.write().await.insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("memory://{}/{key}", self.container))
    }

    async fn delete_if_exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.objects.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_requires_container() {
        let store = InMemoryBlobStore::new();
        let result = store.put("k", Bytes::from_static(b"x"), "image/png").await;
        assert!(matches!(result, Err(BlobError::Upload { .. })));

        store.ensure_container().await.unwrap();
        let url = store
            .put("k", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://task-images/k");
    }

    #[tokio::test]
    async fn test_delete_if_exists_reports_presence() {
        let store = InMemoryBlobStore::new();
        store.ensure_container().await.unwrap();
        store
            .put("a/b", Bytes::from_static(b"x"), "image/gif")
            .await
            .unwrap();

        let handle = store.clone();
        assert!(handle.delete_if_exists("a/b").await.unwrap());
        assert!(!store.delete_if_exists("a/b").await.unwrap());
        assert!(store.is_empty().await);
    }
}
