//! Content-addressed image storage.
//!
//! Photos are uploaded *before* their hash goes into any ledger transition;
//! the ledger itself never waits on external I/O. Stores must be idempotent:
//! putting the same bytes twice yields the same hash and URL.

use std::{collections::HashMap, future::Future, sync::Arc};

use gigledger_types::{ContentHash, ContentStoreConfig, GigError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    pub hash: ContentHash,
    /// Retrieval URL, `<gateway><hex hash>`.
    pub url: String,
}

/// A content-addressed blob store.
pub trait ContentStore: Send + Sync {
    /// Store `content` and return its address.
    fn put(&self, content: Vec<u8>) -> impl Future<Output = Result<StoredContent>> + Send;

    /// Fetch previously stored content.
    fn get(&self, hash: ContentHash) -> impl Future<Output = Result<Option<Arc<[u8]>>>> + Send;
}

/// In-process store keyed by SHA-256.
pub struct MemoryContentStore {
    config: ContentStoreConfig,
    blobs: RwLock<HashMap<ContentHash, Arc<[u8]>>>,
}

impl MemoryContentStore {
    #[must_use]
    pub fn new(config: ContentStoreConfig) -> Self {
        Self {
            config,
            blobs: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn url_for(&self, hash: ContentHash) -> String {
        format!("{}{}", self.config.gateway_url, hash.to_hex())
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new(ContentStoreConfig::default())
    }
}

impl ContentStore for MemoryContentStore {
    async fn put(&self, content: Vec<u8>) -> Result<StoredContent> {
        if content.is_empty() {
            return Err(GigError::Upload {
                reason: "empty upload".into(),
            });
        }
        if content.len() > self.config.max_upload_bytes {
            return Err(GigError::Upload {
                reason: format!(
                    "upload is {} bytes, limit is {}",
                    content.len(),
                    self.config.max_upload_bytes
                ),
            });
        }

        let hash = ContentHash::of(&content);
        let mut blobs = self.blobs.write().await;
        let fresh = !blobs.contains_key(&hash);
        blobs.entry(hash).or_insert_with(|| Arc::from(content));
        drop(blobs);

        tracing::debug!(%hash, fresh, "Content stored");
        Ok(StoredContent {
            hash,
            url: self.url_for(hash),
        })
    }

    async fn get(&self, hash: ContentHash) -> Result<Option<Arc<[u8]>>> {
        Ok(self.blobs.read().await.get(&hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_is_idempotent() {
        let store = MemoryContentStore::default();
        let first = store.put(b"photo".to_vec()).await.unwrap();
        let second = store.put(b"photo".to_vec()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
        assert_eq!(first.url, format!("ipfs://{}", first.hash.to_hex()));
    }

    #[tokio::test]
    async fn get_returns_stored_bytes() {
        let store = MemoryContentStore::default();
        let stored = store.put(b"abc".to_vec()).await.unwrap();
        let bytes = store.get(stored.hash).await.unwrap().unwrap();
        assert_eq!(&*bytes, b"abc");
        assert!(
            store
                .get(ContentHash::of(b"missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn oversized_and_empty_uploads_fail() {
        let store = MemoryContentStore::new(ContentStoreConfig {
            gateway_url: "https://gw.example/ipfs/".into(),
            max_upload_bytes: 4,
        });
        let err = store.put(vec![0u8; 5]).await.unwrap_err();
        assert!(matches!(err, GigError::Upload { .. }));
        assert!(err.is_retryable());
        assert!(store.put(Vec::new()).await.is_err());
        assert!(store.is_empty().await);

        let ok = store.put(vec![1u8; 4]).await.unwrap();
        assert!(ok.url.starts_with("https://gw.example/ipfs/"));
    }
}
