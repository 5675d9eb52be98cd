//! Local filesystem blob store.
//!
//! Blobs are stored as flat files under a configurable root directory;
//! the blob reference is used directly as the file name.  The content
//! type is recorded in a `<ref>.ct` sidecar file so a restart does not
//! lose it.
//!
//! All writes follow the temp-fsync-rename pattern.

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;

use super::backend::{BlobStore, StoredBlob};

/// Extension of the sidecar file holding a blob's content type.
const SIDECAR_EXT: &str = "ct";

/// Stores logo blobs on the local filesystem.
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new `LocalBlobStore` rooted at `root`.
    ///
    /// The directory will be created if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir_all(root.join(".tmp"))?;
        Ok(Self { root })
    }

    /// Resolve a blob reference to an absolute file path.
    ///
    /// Rejects references containing path separators or parent-directory
    /// components so a crafted reference cannot escape the root.
    fn resolve(&self, blob_ref: &str) -> anyhow::Result<PathBuf> {
        if blob_ref.is_empty() || blob_ref.contains('/') || blob_ref.contains('\\') {
            anyhow::bail!("Invalid blob reference: {}", blob_ref);
        }
        for component in std::path::Path::new(blob_ref).components() {
            if let std::path::Component::ParentDir = component {
                anyhow::bail!("Path traversal detected in blob reference: {}", blob_ref);
            }
        }
        Ok(self.root.join(blob_ref))
    }

    /// Path of the sidecar file recording a blob's content type.
    fn sidecar_path(&self, blob_ref: &str) -> anyhow::Result<PathBuf> {
        // Validate the reference itself, then append the sidecar extension.
        self.resolve(blob_ref)?;
        Ok(self.root.join(format!("{blob_ref}.{SIDECAR_EXT}")))
    }

    /// Generate a temp file path under .tmp/ for atomic writes.
    fn temp_path(&self) -> PathBuf {
        let id = uuid::Uuid::new_v4();
        self.root.join(".tmp").join(format!("tmp-{}", id))
    }

    /// Write `data` to `final_path` via temp-fsync-rename.
    fn write_atomic(&self, final_path: &std::path::Path, data: &[u8]) -> anyhow::Result<()> {
        let tmp_path = self.temp_path();
        if let Some(parent) = tmp_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, final_path)?;
        Ok(())
    }
}

impl BlobStore for LocalBlobStore {
    fn put(
        &self,
        blob_ref: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let blob_ref = blob_ref.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            let final_path = self.resolve(&blob_ref)?;
            let sidecar = self.sidecar_path(&blob_ref)?;

            self.write_atomic(&final_path, &data)?;
            self.write_atomic(&sidecar, content_type.as_bytes())?;
            Ok(())
        })
    }

    fn get(
        &self,
        blob_ref: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<StoredBlob>>> + Send + '_>> {
        let blob_ref = blob_ref.to_string();
        Box::pin(async move {
            let path = self.resolve(&blob_ref)?;
            if !path.is_file() {
                return Ok(None);
            }

            let data = Bytes::from(std::fs::read(&path)?);

            let sidecar = self.sidecar_path(&blob_ref)?;
            let content_type = std::fs::read_to_string(&sidecar)
                .unwrap_or_else(|_| "application/octet-stream".to_string());

            let mut hasher = Sha256::new();
            hasher.update(&data);
            let content_hash = hex::encode(hasher.finalize());

            Ok(Some(StoredBlob {
                data,
                content_type,
                content_hash,
            }))
        })
    }

    fn exists(
        &self,
        blob_ref: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let blob_ref = blob_ref.to_string();
        Box::pin(async move {
            let path = self.resolve(&blob_ref)?;
            Ok(path.is_file())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let data = Bytes::from_static(b"\x89PNG logo bytes");
        store
            .put("abc-123.png", data.clone(), "image/png")
            .await
            .unwrap();

        let blob = store.get("abc-123.png").await.unwrap().unwrap();
        assert_eq!(blob.data, data);
        assert_eq!(blob.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        assert!(store.get("missing.png").await.unwrap().is_none());
        assert!(!store.exists("missing.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let err = store
            .put("../escape.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid blob reference"));

        assert!(store
            .put("a/b.png", Bytes::from_static(b"x"), "image/png")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_content_type_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = LocalBlobStore::new(dir.path()).unwrap();
            store
                .put("x.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
                .await
                .unwrap();
        }
        let store = LocalBlobStore::new(dir.path()).unwrap();
        let blob = store.get("x.jpg").await.unwrap().unwrap();
        assert_eq!(blob.content_type, "image/jpeg");
    }
}
