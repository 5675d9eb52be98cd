//! In-memory brand catalog.
//!
//! Stores all records in memory with no persistence.  Useful for testing
//! and ephemeral deployments.  Uses `RwLock<HashMap>` keyed by normalized
//! name for thread-safe access.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use super::store::{BrandRecord, CatalogStore, InsertOutcome};

/// In-memory catalog store.
pub struct MemoryCatalogStore {
    /// normalized_name -> record.
    brands: RwLock<HashMap<String, BrandRecord>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            brands: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn exists_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let normalized_name = normalized_name.to_string();
        Box::pin(async move {
            let brands = self.brands.read().expect("rwlock poisoned");
            Ok(brands.contains_key(&normalized_name))
        })
    }

    fn insert(
        &self,
        record: BrandRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<InsertOutcome>> + Send + '_>> {
        Box::pin(async move {
            let mut brands = self.brands.write().expect("rwlock poisoned");
            // Check and insert happen under the same write lock, so the
            // insert-if-absent is atomic.
            if brands.contains_key(&record.normalized_name) {
                return Ok(InsertOutcome::Conflict);
            }
            brands.insert(record.normalized_name.clone(), record);
            Ok(InsertOutcome::Inserted)
        })
    }

    fn list_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<BrandRecord>>> + Send + '_>> {
        Box::pin(async move {
            let brands = self.brands.read().expect("rwlock poisoned");
            Ok(brands.values().cloned().collect())
        })
    }
}
