//! In-memory blob store.
//!
//! Blobs are held in a `tokio::sync::RwLock<HashMap<...>>` keyed by blob
//! reference.  A configurable memory limit (`max_size_bytes`) caps total
//! stored bytes.  Useful for tests and ephemeral deployments.

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::backend::{BlobStore, StoredBlob};

/// In-memory blob store.
pub struct MemoryBlobStore {
    /// Blob map: blob_ref -> (data, content_type).
    blobs: tokio::sync::RwLock<HashMap<String, (Bytes, String)>>,
    /// Current total bytes stored.
    current_size: tokio::sync::RwLock<u64>,
    /// Maximum bytes allowed.  0 means unlimited.
    max_size_bytes: u64,
}

impl MemoryBlobStore {
    /// Create a new `MemoryBlobStore` with the given byte cap (0 = unlimited).
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            blobs: tokio::sync::RwLock::new(HashMap::new()),
            current_size: tokio::sync::RwLock::new(0),
            max_size_bytes,
        }
    }

    /// Compute the hex SHA-256 content hash for a byte slice.
    fn compute_content_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Check whether adding `additional` bytes would exceed the memory limit.
    async fn check_capacity(&self, additional: u64) -> anyhow::Result<()> {
        if self.max_size_bytes == 0 {
            return Ok(());
        }
        let current = *self.current_size.read().await;
        if current + additional > self.max_size_bytes {
            anyhow::bail!(
                "Memory limit exceeded: current={current}, additional={additional}, max={}",
                self.max_size_bytes
            );
        }
        Ok(())
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(
        &self,
        blob_ref: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let blob_ref = blob_ref.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            self.check_capacity(data.len() as u64).await?;

            let mut blobs = self.blobs.write().await;
            let mut size = self.current_size.write().await;

            // Replacing an existing blob releases its accounted bytes.
            if let Some((old, _)) = blobs.get(&blob_ref) {
                *size = size.saturating_sub(old.len() as u64);
            }
            *size = size.saturating_add(data.len() as u64);
            blobs.insert(blob_ref, (data, content_type));
            Ok(())
        })
    }

    fn get(
        &self,
        blob_ref: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<StoredBlob>>> + Send + '_>> {
        let blob_ref = blob_ref.to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().await;
            Ok(blobs.get(&blob_ref).map(|(data, content_type)| StoredBlob {
                data: data.clone(),
                content_type: content_type.clone(),
                content_hash: Self::compute_content_hash(data),
            }))
        })
    }

    fn exists(
        &self,
        blob_ref: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let blob_ref = blob_ref.to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().await;
            Ok(blobs.contains_key(&blob_ref))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let store = MemoryBlobStore::new(0);
        let data = Bytes::from_static(b"logo bytes");
        store.put("a.png", data.clone(), "image/png").await.unwrap();

        let blob = store.get("a.png").await.unwrap().unwrap();
        assert_eq!(blob.data, data);
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.content_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryBlobStore::new(0);
        assert!(store.get("nope.png").await.unwrap().is_none());
        assert!(!store.exists("nope.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_after_put() {
        let store = MemoryBlobStore::new(0);
        store
            .put("b.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap();
        assert!(store.exists("b.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_limit_enforced() {
        let store = MemoryBlobStore::new(4);
        store
            .put("a", Bytes::from_static(b"1234"), "image/png")
            .await
            .unwrap();
        let err = store
            .put("b", Bytes::from_static(b"5"), "image/png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Memory limit exceeded"));
    }

    #[tokio::test]
    async fn test_overwrite_releases_accounted_bytes() {
        let store = MemoryBlobStore::new(6);
        store
            .put("a", Bytes::from_static(b"1234"), "image/png")
            .await
            .unwrap();
        // Replacing the 4-byte blob with another 4-byte blob must fit.
        store
            .put("a", Bytes::from_static(b"5678"), "image/png")
            .await
            .unwrap();
        let blob = store.get("a").await.unwrap().unwrap();
        assert_eq!(blob.data, Bytes::from_static(b"5678"));
    }
}
