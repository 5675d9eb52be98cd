//! Abstract blob store trait.
//!
//! Every logo storage backend must implement [`BlobStore`].  The trait
//! works in terms of opaque byte blobs addressed by a string reference
//! so callers do not need to know the underlying medium.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

/// A stored blob's data plus the content type it was uploaded with and
/// its hex-encoded SHA-256 content hash.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Raw bytes of the blob.
    pub data: Bytes,
    /// MIME content type recorded at upload time.
    pub content_type: String,
    /// Hex-encoded SHA-256 of the data.
    pub content_hash: String,
}

/// Async blob store contract.
pub trait BlobStore: Send + Sync + 'static {
    /// Write `data` under `blob_ref` with the given content type.
    ///
    /// Overwrite semantics are the store's default; callers avoid
    /// collisions by embedding a fresh UUID in every `blob_ref`.
    fn put(
        &self,
        blob_ref: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Read the full blob at `blob_ref`.
    fn get(
        &self,
        blob_ref: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<StoredBlob>>> + Send + '_>>;

    /// Check whether a blob exists at `blob_ref`.
    fn exists(
        &self,
        blob_ref: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>>;
}

/// Resolve a blob reference to its public URL.
///
/// Pure string construction from the configured base URL; never checks
/// that the blob actually exists.
pub fn url_of(public_base_url: &str, blob_ref: &str) -> String {
    format!("{}/{}", public_base_url.trim_end_matches('/'), blob_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_of_joins_base_and_ref() {
        assert_eq!(
            url_of("http://localhost:9012/logos", "abc.png"),
            "http://localhost:9012/logos/abc.png"
        );
    }

    #[test]
    fn test_url_of_trims_trailing_slash() {
        assert_eq!(
            url_of("http://cdn.example.com/logos/", "abc.png"),
            "http://cdn.example.com/logos/abc.png"
        );
    }
}
