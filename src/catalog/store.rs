//! Abstract brand catalog store trait.
//!
//! Any catalog backend must implement [`CatalogStore`].  The trait uses
//! manually desugared async methods (pinned futures) so it can back both
//! the in-memory store and SQLite behind a single `Arc<dyn CatalogStore>`.

use std::future::Future;
use std::pin::Pin;

/// Catalog record for a single brand.
///
/// Brands are created exactly once and never updated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandRecord {
    /// Opaque unique identifier generated at creation (UUID v4).
    pub id: String,
    /// User-supplied display name, case preserved.
    pub name: String,
    /// Lower-cased `name`; the uniqueness key.
    pub normalized_name: String,
    /// Blob reference of the stored logo (`<uuid>.<ext>`).
    pub logo_blob_ref: String,
    /// Detected MIME type the logo was stored with.
    pub logo_content_type: String,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
}

/// Outcome of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was inserted.
    Inserted,
    /// A record with the same normalized name already existed; nothing
    /// was written.
    Conflict,
}

/// Async brand catalog contract.
///
/// `insert` is a conditional insert-if-absent keyed on `normalized_name`,
/// so uniqueness is store-enforced even when two concurrent creates pass
/// the existence check together.
pub trait CatalogStore: Send + Sync + 'static {
    /// Point lookup by already-lower-cased name.
    fn exists_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>>;

    /// Insert a brand record unless its normalized name is already taken.
    fn insert(
        &self,
        record: BrandRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<InsertOutcome>> + Send + '_>>;

    /// Full scan of all brand records.  No pagination; the catalog is
    /// tens to low hundreds of rows by design.
    fn list_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<BrandRecord>>> + Send + '_>>;
}

/// Format the current time as an ISO-8601 UTC timestamp with millisecond
/// precision, without pulling in a date-time crate.
pub fn iso8601_now() -> String {
    let since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_timestamp(since_epoch.as_secs(), since_epoch.subsec_millis())
}

fn format_timestamp(secs: u64, millis: u32) -> String {
    let days = secs / 86400;
    let day_secs = secs % 86400;
    let hours = day_secs / 3600;
    let minutes = (day_secs % 3600) / 60;
    let seconds = day_secs % 60;
    let (year, month, day) = days_to_ymd(days);
    format!("{year:04}-{month:02}-{day:02}T{hours:02}:{minutes:02}:{seconds:02}.{millis:03}Z")
}

fn days_to_ymd(days: u64) -> (i32, u32, u32) {
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };
    (year as i32, m as u32, d as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_epoch() {
        assert_eq!(format_timestamp(0, 0), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_format_timestamp_known_instant() {
        assert_eq!(format_timestamp(1_787_704_496, 7), "2026-08-26T00:34:56.007Z");
    }

    #[test]
    fn test_iso8601_now_shape() {
        let ts = iso8601_now();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
    }
}
