//! Systems repository: the persistence operations the sync engine issues.
//!
//! Every free function takes a `&libsql::Connection` so it can run either
//! directly or inside a caller-controlled transaction (`&Transaction` derefs
//! to `&Connection`). The `CatalogDb` methods below wrap them in one
//! transaction per batch.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rse_core::{CatalogEntry, ResolvedSystem, Source, SourceClaims};

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::{id_from_sql, id_to_sql, row_to_entry};

const UPSERT_SQL: &str = "INSERT INTO systems
     (id, name, x, y, z, uncertainty, action_flags, created_at, updated_at, deleted_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, NULL)
     ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        x = excluded.x,
        y = excluded.y,
        z = excluded.z,
        uncertainty = excluded.uncertainty,
        action_flags = systems.action_flags | excluded.action_flags,
        updated_at = excluded.updated_at,
        deleted_at = NULL";

/// A row currently claimed by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRow {
    pub id: u64,
    pub name: String,
}

/// Outcome of retiring a set of ids from one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetireOutcome {
    /// Rows that lost the source's claim.
    pub retired: u64,
    /// Of those, rows that lost their last claim and were soft-deleted.
    pub soft_deleted: u64,
}

/// Rows claimed by `source` and not soft-deleted.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails.
pub async fn select_active(
    conn: &libsql::Connection,
    source: Source,
) -> Result<Vec<ActiveRow>, DatabaseError> {
    let bit = i64::from(source.bit());
    let mut rows = conn
        .query(
            "SELECT id, name FROM systems
             WHERE (action_flags & ?1) = ?1 AND deleted_at IS NULL",
            [bit],
        )
        .await?;

    let mut active = Vec::new();
    while let Some(row) = rows.next().await? {
        active.push(ActiveRow {
            id: id_from_sql(row.get::<i64>(0)?),
            name: row.get::<String>(1)?,
        });
    }
    Ok(active)
}

/// Ids claimed by `source` and not soft-deleted.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails.
pub async fn select_active_ids(
    conn: &libsql::Connection,
    source: Source,
) -> Result<HashSet<u64>, DatabaseError> {
    Ok(select_active(conn, source)
        .await?
        .into_iter()
        .map(|row| row.id)
        .collect())
}

/// Insert or refresh one system and add `source`'s claim to it.
///
/// # Errors
///
/// Returns `DatabaseError` if the statement fails.
pub async fn upsert_system(
    conn: &libsql::Connection,
    system: &ResolvedSystem,
    source: Source,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        UPSERT_SQL,
        libsql::params![
            id_to_sql(system.id),
            system.name.as_str(),
            system.x,
            system.y,
            system.z,
            i64::from(system.uncertainty),
            i64::from(source.bit()),
            now.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

/// Upsert every record of a batch. Runs within whatever transaction `conn`
/// belongs to.
///
/// # Errors
///
/// Returns `DatabaseError` on the first failing statement.
pub async fn upsert_batch(
    conn: &libsql::Connection,
    systems: &[ResolvedSystem],
    source: Source,
    now: DateTime<Utc>,
) -> Result<u64, DatabaseError> {
    for system in systems {
        upsert_system(conn, system, source, now).await?;
    }
    Ok(systems.len() as u64)
}

/// Release `source`'s claim on `id`. Returns whether the row held it.
///
/// # Errors
///
/// Returns `DatabaseError` if the statement fails.
pub async fn clear_source_bit(
    conn: &libsql::Connection,
    id: u64,
    source: Source,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE systems SET action_flags = (action_flags & ?2), updated_at = ?3
             WHERE id = ?1 AND (action_flags & ?4) != 0",
            libsql::params![
                id_to_sql(id),
                i64::from(SourceClaims::release_mask(source)),
                now.to_rfc3339(),
                i64::from(source.bit())
            ],
        )
        .await?;
    Ok(changed > 0)
}

/// Soft-delete `id` if no source claims it any more. Returns whether the row
/// was soft-deleted by this call.
///
/// # Errors
///
/// Returns `DatabaseError` if the statement fails.
pub async fn soft_delete_if_mask_zero(
    conn: &libsql::Connection,
    id: u64,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE systems SET deleted_at = ?2, updated_at = ?2
             WHERE id = ?1 AND action_flags = 0 AND deleted_at IS NULL",
            libsql::params![id_to_sql(id), now.to_rfc3339()],
        )
        .await?;
    Ok(changed > 0)
}

async fn retire_all(
    conn: &libsql::Connection,
    ids: &[u64],
    source: Source,
    now: DateTime<Utc>,
) -> Result<RetireOutcome, DatabaseError> {
    let mut outcome = RetireOutcome::default();
    for &id in ids {
        if clear_source_bit(conn, id, source, now).await? {
            outcome.retired += 1;
        }
        if soft_delete_if_mask_zero(conn, id, now).await? {
            outcome.soft_deleted += 1;
        }
    }
    Ok(outcome)
}

/// Roll back a failed batch; `error` stays the reported cause.
async fn abandon(tx: libsql::Transaction, error: DatabaseError) -> DatabaseError {
    if let Err(rollback) = tx.rollback().await {
        tracing::warn!(error = %rollback, "rollback of failed batch also failed");
    }
    error
}

impl CatalogDb {
    /// Commit one batch of upserts as a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any statement or the commit fails; nothing
    /// of the batch is persisted in that case.
    pub async fn commit_upserts(
        &self,
        systems: &[ResolvedSystem],
        source: Source,
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let tx = self.conn().transaction().await?;
        match upsert_batch(&tx, systems, source, now).await {
            Ok(written) => {
                tx.commit().await?;
                Ok(written)
            }
            Err(e) => Err(abandon(tx, e).await),
        }
    }

    /// Release `source`'s claim on every id, soft-deleting rows whose last
    /// claim goes, as a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any statement or the commit fails.
    pub async fn commit_retirements(
        &self,
        ids: &[u64],
        source: Source,
        now: DateTime<Utc>,
    ) -> Result<RetireOutcome, DatabaseError> {
        let tx = self.conn().transaction().await?;
        match retire_all(&tx, ids, source, now).await {
            Ok(outcome) => {
                tx.commit().await?;
                Ok(outcome)
            }
            Err(e) => Err(abandon(tx, e).await),
        }
    }

    /// Rows claimed by `source` and not soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn active_rows(&self, source: Source) -> Result<Vec<ActiveRow>, DatabaseError> {
        select_active(self.conn(), source).await
    }

    /// Discard every catalog row ahead of a full rebuild.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn reset_systems(&self) -> Result<u64, DatabaseError> {
        let tx = self.conn().transaction().await?;
        let removed = tx.execute("DELETE FROM systems", ()).await?;
        tx.commit().await?;
        tracing::info!(removed, "catalog reset for full rebuild");
        Ok(removed)
    }

    /// Fetch one row by id, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or row decoding fails.
    pub async fn get_system(&self, id: u64) -> Result<Option<CatalogEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, name, x, y, z, uncertainty, action_flags, created_at, updated_at, deleted_at
                 FROM systems WHERE id = ?1",
                [id_to_sql(id)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }
}
