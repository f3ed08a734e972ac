//! In-memory blob store for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use certi_core::ContentRef;
use parking_lot::Mutex;

use crate::error::BlobError;
use crate::fs::sha256_hex;
use crate::store::{BlobPayload, BlobStore};

/// SHA-256 keyed map with an availability switch. Clones share storage.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    online: Arc<AtomicBool>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            blobs: Arc::default(),
            online: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, every `put` fails with [`BlobError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn get(&self, content_ref: &ContentRef) -> Option<Vec<u8>> {
        self.blobs.lock().get(content_ref.as_str()).cloned()
    }

    pub fn contains(&self, content_ref: &ContentRef) -> bool {
        self.blobs.lock().contains_key(content_ref.as_str())
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, payload: BlobPayload) -> Result<ContentRef, BlobError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("in-memory blob store is offline".into()));
        }
        let digest = sha256_hex(&payload.bytes);
        self.blobs.lock().insert(digest.clone(), payload.bytes);
        Ok(ContentRef::new(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_stores_under_digest() {
        let store = MemoryBlobStore::new();
        let content_ref = store.put(BlobPayload::new("a.txt", b"hello".to_vec())).await.unwrap();
        assert!(store.contains(&content_ref));
        assert_eq!(store.get(&content_ref), Some(b"hello".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn offline_store_refuses_uploads() {
        let store = MemoryBlobStore::new();
        store.set_online(false);
        let result = store.put(BlobPayload::new("a.txt", b"hello".to_vec())).await;
        assert!(matches!(result, Err(BlobError::Unavailable(_))));
        assert!(store.is_empty());
    }
}
