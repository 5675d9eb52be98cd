//! SQLite-backed brand catalog.
//!
//! Uses `rusqlite` with the `bundled` feature so no system SQLite
//! library is required.  All async trait methods are thin wrappers
//! around synchronous rusqlite calls executed under a `Mutex`.
//!
//! The `brands` table carries a UNIQUE index on `normalized_name`, so
//! uniqueness is enforced by the store itself; `insert` uses
//! `INSERT OR IGNORE` and reports a conflict when no row was written.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::store::{BrandRecord, CatalogStore, InsertOutcome};

/// Current schema version.  Bumped when migrations are added.
const SCHEMA_VERSION: i64 = 1;

/// Brand catalog backed by a single SQLite database file.
pub struct SqliteCatalogStore {
    /// The database connection, guarded by a mutex for Send + Sync.
    conn: Mutex<Connection>,
}

impl SqliteCatalogStore {
    /// Open (or create) the database at `path` and initialize the schema.
    ///
    /// Passing `":memory:"` creates an in-memory database (useful for tests).
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.apply_pragmas()?;
        store.init_db()?;
        Ok(store)
    }

    /// Apply recommended SQLite pragmas for performance and safety.
    fn apply_pragmas(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("mutex poisoned");
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        Ok(())
    }

    /// Create the required tables and indexes if they do not already exist.
    /// Idempotent, safe to run on every startup.
    fn init_db(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("mutex poisoned");
        conn.execute_batch(
            "
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version    INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );

            -- Brands
            CREATE TABLE IF NOT EXISTS brands (
                id                 TEXT PRIMARY KEY,
                name               TEXT NOT NULL,
                normalized_name    TEXT NOT NULL,
                logo_blob_ref      TEXT NOT NULL,
                logo_content_type  TEXT NOT NULL DEFAULT 'application/octet-stream',
                created_at         TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_brands_normalized_name
                ON brands(normalized_name);
            ",
        )?;

        // Record schema version if not already present.
        let existing: Option<i64> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        if existing.is_none() || existing.unwrap() < SCHEMA_VERSION {
            let now = super::store::iso8601_now();
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![SCHEMA_VERSION, now],
            )?;
        }

        Ok(())
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn exists_by_normalized_name(
        &self,
        normalized_name: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + '_>> {
        let normalized_name = normalized_name.to_string();
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM brands WHERE normalized_name = ?1",
                params![normalized_name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    fn insert(
        &self,
        record: BrandRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<InsertOutcome>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let changed = conn.execute(
                "INSERT OR IGNORE INTO brands
                     (id, name, normalized_name, logo_blob_ref, logo_content_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.name,
                    record.normalized_name,
                    record.logo_blob_ref,
                    record.logo_content_type,
                    record.created_at,
                ],
            )?;
            if changed == 0 {
                Ok(InsertOutcome::Conflict)
            } else {
                Ok(InsertOutcome::Inserted)
            }
        })
    }

    fn list_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<BrandRecord>>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let mut stmt = conn.prepare(
                "SELECT id, name, normalized_name, logo_blob_ref, logo_content_type, created_at
                 FROM brands",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(BrandRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    normalized_name: row.get(2)?,
                    logo_blob_ref: row.get(3)?,
                    logo_content_type: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut brands = Vec::new();
            for row in rows {
                brands.push(row?);
            }
            Ok(brands)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::iso8601_now;

    fn record(name: &str) -> BrandRecord {
        BrandRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            normalized_name: name.to_lowercase(),
            logo_blob_ref: format!("{}.png", uuid::Uuid::new_v4()),
            logo_content_type: "image/png".to_string(),
            created_at: iso8601_now(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_exists() {
        let store = SqliteCatalogStore::new(":memory:").unwrap();
        assert!(!store.exists_by_normalized_name("ford").await.unwrap());

        assert_eq!(
            store.insert(record("Ford")).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert!(store.exists_by_normalized_name("ford").await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_normalized_name() {
        let store = SqliteCatalogStore::new(":memory:").unwrap();
        store.insert(record("Tesla")).await.unwrap();

        // Different id and blob ref, same normalized name.
        assert_eq!(
            store.insert(record("TESLA")).await.unwrap(),
            InsertOutcome::Conflict
        );

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Tesla");
    }

    #[tokio::test]
    async fn test_list_all_round_trips_fields() {
        let store = SqliteCatalogStore::new(":memory:").unwrap();
        let rec = record("Toyota");
        store.insert(rec.clone()).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![rec]);
    }

    #[tokio::test]
    async fn test_schema_init_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteCatalogStore::new(path).unwrap();
            store.insert(record("Ford")).await.unwrap();
        }
        // Reopening runs init_db again and must keep existing rows.
        let store = SqliteCatalogStore::new(path).unwrap();
        assert!(store.exists_by_normalized_name("ford").await.unwrap());
    }
}
