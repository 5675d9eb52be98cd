//! Brand catalog service -- the decision logic.
//!
//! `create_brand` validates an inbound logo upload (declared content
//! type, name, magic-number sniffing, duplicate check), uploads the blob,
//! then inserts the catalog row; `list_brands` renders the public listing.
//! Everything else in the crate is adapters and plumbing around these two
//! operations.

use bytes::Bytes;
use garde::Validate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::store::{iso8601_now, BrandRecord, CatalogStore, InsertOutcome};
use crate::errors::ApiError;
use crate::metrics::{BRAND_CREATES_TOTAL, BRAND_LISTS_TOTAL};
use crate::storage::backend::{url_of, BlobStore};

/// The only content type the create operation accepts: the raw binary
/// sentinel.  The true file type is sniffed from the bytes, never taken
/// from the client.
pub const RAW_BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Validation struct for inbound brand names.
#[derive(Debug, Validate)]
pub struct BrandName {
    /// Display name; must be non-empty.
    #[garde(length(min = 1))]
    pub name: String,
}

/// Public listing entry: what the presentation client consumes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BrandSummary {
    /// Display name, case preserved.
    pub name: String,
    /// Publicly fetchable logo URL.
    #[serde(rename = "logoUrl")]
    pub logo_url: String,
}

/// Detected image type: MIME plus preferred file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedImage {
    /// MIME type, e.g. `image/png`.
    pub mime: &'static str,
    /// Preferred extension, e.g. `png`.
    pub ext: &'static str,
}

/// Sniff the true image type from magic bytes.
///
/// Returns `None` when the bytes do not start with a known image
/// signature.  The `image` crate only recognises image formats, so a
/// successful sniff is by itself proof the payload is image-category.
pub fn sniff_image(data: &[u8]) -> Option<SniffedImage> {
    let format = image::guess_format(data).ok()?;
    let ext = format.extensions_str().first().copied()?;
    Some(SniffedImage {
        mime: format.to_mime_type(),
        ext,
    })
}

/// The brand catalog service.
///
/// Constructed once at startup with its two adapters injected, then
/// shared across requests behind `Arc<AppState>`.
pub struct BrandCatalog {
    catalog: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
    public_base_url: String,
}

impl BrandCatalog {
    /// Create a new `BrandCatalog` over the given adapters.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        blobs: Arc<dyn BlobStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            blobs,
            public_base_url: public_base_url.into(),
        }
    }

    /// Create a brand from a raw logo upload.
    ///
    /// Validation order matters and is externally observable:
    /// content-type sentinel, then name, then sniffing, then duplicate
    /// check.  The blob upload strictly precedes the catalog insert so a
    /// failed upload never leaves a catalog row behind.
    pub async fn create_brand(
        &self,
        name: &str,
        declared_content_type: Option<&str>,
        body: Bytes,
    ) -> Result<(), ApiError> {
        if declared_content_type != Some(RAW_BINARY_CONTENT_TYPE) {
            metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "bad_content_type").increment(1);
            return Err(ApiError::BadContentType);
        }

        let brand_name = BrandName {
            name: name.to_string(),
        };
        if brand_name.validate().is_err() {
            metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "missing_name").increment(1);
            return Err(ApiError::MissingName);
        }

        let sniffed = match sniff_image(&body) {
            Some(s) => s,
            None => {
                debug!("rejecting upload for '{name}': payload is not a recognised image");
                metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "invalid_binary").increment(1);
                return Err(ApiError::InvalidBinary);
            }
        };

        let normalized_name = name.to_lowercase();
        if self
            .catalog
            .exists_by_normalized_name(&normalized_name)
            .await?
        {
            metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "duplicate").increment(1);
            return Err(ApiError::DuplicateBrand {
                name: name.to_string(),
            });
        }

        let blob_ref = format!("{}.{}", uuid::Uuid::new_v4(), sniffed.ext);

        // Upload before insert.  An upload failure surfaces as the same
        // generic "bad image" message the sniff failure uses; the real
        // cause only reaches the log.
        if let Err(err) = self.blobs.put(&blob_ref, body, sniffed.mime).await {
            warn!("logo upload failed for '{name}' ({blob_ref}): {err:#}");
            metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "invalid_binary").increment(1);
            return Err(ApiError::InvalidBinary);
        }

        let record = BrandRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            normalized_name,
            logo_blob_ref: blob_ref,
            logo_content_type: sniffed.mime.to_string(),
            created_at: iso8601_now(),
        };

        // The store-level conditional insert closes the window between
        // the existence check above and this write.
        match self.catalog.insert(record).await? {
            InsertOutcome::Inserted => {
                metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "created").increment(1);
                Ok(())
            }
            InsertOutcome::Conflict => {
                metrics::counter!(BRAND_CREATES_TOTAL, "outcome" => "duplicate").increment(1);
                Err(ApiError::DuplicateBrand {
                    name: name.to_string(),
                })
            }
        }
    }

    /// List every brand as `{name, logoUrl}`.
    ///
    /// Pure read; the full catalog is materialised per call (no
    /// pagination, the corpus is small by design).  Store failures
    /// surface as a 500 instead of an empty listing.
    pub async fn list_brands(&self) -> Result<Vec<BrandSummary>, ApiError> {
        let rows = self.catalog.list_all().await?;
        metrics::counter!(BRAND_LISTS_TOTAL).increment(1);
        Ok(rows
            .into_iter()
            .map(|row| BrandSummary {
                name: row.name,
                logo_url: url_of(&self.public_base_url, &row.logo_blob_ref),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalogStore;
    use crate::storage::memory::MemoryBlobStore;

    /// Smallest byte prefix the sniffer recognises as PNG.
    pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    /// JPEG SOI marker plus JFIF app segment.
    pub const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00";

    fn service() -> (BrandCatalog, Arc<MemoryBlobStore>, Arc<MemoryCatalogStore>) {
        let catalog = Arc::new(MemoryCatalogStore::new());
        let blobs = Arc::new(MemoryBlobStore::new(0));
        let svc = BrandCatalog::new(
            catalog.clone(),
            blobs.clone(),
            "http://localhost:9012/logos",
        );
        (svc, blobs, catalog)
    }

    #[test]
    fn test_sniff_png() {
        let sniffed = sniff_image(PNG_MAGIC).unwrap();
        assert_eq!(sniffed.mime, "image/png");
        assert_eq!(sniffed.ext, "png");
    }

    #[test]
    fn test_sniff_jpeg() {
        let sniffed = sniff_image(JPEG_MAGIC).unwrap();
        assert_eq!(sniffed.mime, "image/jpeg");
    }

    #[test]
    fn test_sniff_rejects_text_and_truncated_payloads() {
        assert!(sniff_image(b"hello, world").is_none());
        assert!(sniff_image(b"").is_none());
        // Truncated PNG header: only the first two magic bytes.
        assert!(sniff_image(b"\x89P").is_none());
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (svc, _, _) = service();
        svc.create_brand(
            "Tesla",
            Some(RAW_BINARY_CONTENT_TYPE),
            Bytes::from_static(PNG_MAGIC),
        )
        .await
        .unwrap();

        let brands = svc.list_brands().await.unwrap();
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].name, "Tesla");
        assert!(brands[0]
            .logo_url
            .starts_with("http://localhost:9012/logos/"));
        assert!(brands[0].logo_url.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_created_blob_round_trips() {
        let (svc, blobs, catalog) = service();
        svc.create_brand(
            "Tesla",
            Some(RAW_BINARY_CONTENT_TYPE),
            Bytes::from_static(JPEG_MAGIC),
        )
        .await
        .unwrap();

        let rows = catalog.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        let blob = blobs.get(&rows[0].logo_blob_ref).await.unwrap().unwrap();
        assert_eq!(blob.data, Bytes::from_static(JPEG_MAGIC));
        assert!(blob.content_type.starts_with("image/"));
    }

    #[tokio::test]
    async fn test_wrong_content_type_rejected_before_io() {
        let (svc, blobs, catalog) = service();
        let err = svc
            .create_brand("Ford", Some("image/png"), Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadContentType));

        let err = svc
            .create_brand("Ford", None, Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadContentType));

        // No blob, no row.
        assert!(catalog.list_all().await.unwrap().is_empty());
        assert!(blobs.get("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_io() {
        let (svc, _, catalog) = service();
        let err = svc
            .create_brand(
                "",
                Some(RAW_BINARY_CONTENT_TYPE),
                Bytes::from_static(PNG_MAGIC),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingName));
        assert!(catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_image_payload_rejected_before_io() {
        let (svc, _, catalog) = service();
        let err = svc
            .create_brand(
                "Ford",
                Some(RAW_BINARY_CONTENT_TYPE),
                Bytes::from_static(b"just some text"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidBinary));
        assert!(catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejected_including_case_variants() {
        let (svc, _, _) = service();
        svc.create_brand(
            "Ford",
            Some(RAW_BINARY_CONTENT_TYPE),
            Bytes::from_static(PNG_MAGIC),
        )
        .await
        .unwrap();

        for variant in ["Ford", "ford", "FORD"] {
            let err = svc
                .create_brand(
                    variant,
                    Some(RAW_BINARY_CONTENT_TYPE),
                    Bytes::from_static(PNG_MAGIC),
                )
                .await
                .unwrap_err();
            assert!(
                matches!(err, ApiError::DuplicateBrand { ref name } if name == variant),
                "expected DuplicateBrand for {variant}"
            );
        }

        assert_eq!(svc.list_brands().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_as_invalid_binary_and_writes_no_row() {
        // A 1-byte cap makes every upload fail after validation passes.
        let catalog = Arc::new(MemoryCatalogStore::new());
        let blobs = Arc::new(MemoryBlobStore::new(1));
        let svc = BrandCatalog::new(catalog.clone(), blobs, "http://localhost:9012/logos");

        let err = svc
            .create_brand(
                "Ford",
                Some(RAW_BINARY_CONTENT_TYPE),
                Bytes::from_static(PNG_MAGIC),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidBinary));
        assert!(catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_catalog() {
        let (svc, _, _) = service();
        assert!(svc.list_brands().await.unwrap().is_empty());
    }
}
