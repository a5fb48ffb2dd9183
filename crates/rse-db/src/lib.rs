//! # rse-db
//!
//! libSQL storage for the system catalog.
//!
//! Holds the `systems` table with its per-source claim mask, the `sources`
//! registry naming each bit, and the `duplicates` table of names that
//! matched more than one identity. All writes go through transactions so a
//! failed batch leaves nothing behind.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod retry;

use std::time::Duration;

use error::DatabaseError;
use libsql::Builder;

pub use migrations::create_schema_if_absent;
pub use repos::systems::{ActiveRow, RetireOutcome};

/// Central handle to the catalog database.
pub struct CatalogDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl CatalogDb {
    /// Open a local database at the given path. `":memory:"` opens a
    /// throwaway catalog.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let catalog = Self { db, conn };
        catalog.run_migrations().await?;
        Ok(catalog)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Whether a usable catalog with at least one row exists.
    ///
    /// A failing probe is retried once after `retry_delay`; a second failure
    /// is reported as "no valid catalog" rather than an error so the caller
    /// can fall back to a full rebuild.
    pub async fn is_present_and_valid(&self, retry_delay: Duration) -> bool {
        let config = retry::RetryConfig::once(retry_delay);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.probe().await {
                Ok(present) => return present,
                Err(e) if attempt < config.max_attempts => {
                    tracing::warn!(error = %e, "catalog probe failed, retrying");
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "catalog probe failed twice, treating as absent");
                    return false;
                }
            }
        }
    }

    async fn probe(&self) -> Result<bool, DatabaseError> {
        let mut rows = self.conn.query("SELECT id FROM systems LIMIT 10", ()).await?;
        Ok(rows.next().await?.is_some())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::test_db;

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        for table in ["systems", "sources", "duplicates"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                )
                .await
                .unwrap();
            assert!(rows.next().await.unwrap().is_some(), "missing table {table}");
        }

        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'systems_coordinates'",
                (),
            )
            .await
            .unwrap();
        assert!(rows.next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        create_schema_if_absent(db.conn()).await.unwrap();

        let count = helpers::query_count(db.conn(), "SELECT COUNT(*) FROM sources", ())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn empty_catalog_is_not_valid() {
        let db = test_db().await;
        assert!(!db.is_present_and_valid(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn missing_table_counts_as_absent() {
        let db = test_db().await;
        db.conn().execute("DROP TABLE systems", ()).await.unwrap();
        assert!(!db.is_present_and_valid(Duration::ZERO).await);
    }
}
