//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use rse_core::Source;

use crate::CatalogDb;
use crate::error::DatabaseError;

/// Initial schema: systems, sources, duplicates.
const MIGRATION_001: &str = include_str!("../migrations/001_catalog.sql");

/// Create every table and index, then register the known sources.
///
/// # Errors
///
/// Returns [`DatabaseError::Migration`] if any statement fails.
pub async fn create_schema_if_absent(conn: &libsql::Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(MIGRATION_001)
        .await
        .map_err(|e| DatabaseError::Migration(format!("001_catalog: {e}")))?;

    for source in Source::ALL {
        conn.execute(
            "INSERT INTO sources (bit, label, explanation) VALUES (?1, ?2, ?3)
             ON CONFLICT(bit) DO UPDATE SET label = excluded.label, explanation = excluded.explanation",
            libsql::params![i64::from(source.bit()), source.as_str(), source.explanation()],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("seed source {source}: {e}")))?;
    }
    Ok(())
}

impl CatalogDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        create_schema_if_absent(self.conn()).await
    }
}
