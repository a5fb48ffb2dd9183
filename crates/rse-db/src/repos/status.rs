//! Catalog summaries for `rse status` and `rse verify`.

use rse_core::{Source, SourceCount, StatusReport, VerifyReport};

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::query_count;

impl CatalogDb {
    /// Row totals, per-source active counts, and pending ambiguous names.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any count query fails.
    pub async fn status(&self) -> Result<StatusReport, DatabaseError> {
        let conn = self.conn();
        let total = query_count(conn, "SELECT COUNT(*) FROM systems", ()).await?;
        let deleted = query_count(
            conn,
            "SELECT COUNT(*) FROM systems WHERE deleted_at IS NOT NULL",
            (),
        )
        .await?;

        let mut by_source = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            let active = query_count(
                conn,
                "SELECT COUNT(*) FROM systems WHERE (action_flags & ?1) != 0 AND deleted_at IS NULL",
                [i64::from(source.bit())],
            )
            .await?;
            by_source.push(SourceCount { source, active });
        }

        let ambiguous_pending = query_count(conn, "SELECT COUNT(*) FROM duplicates", ()).await?;

        Ok(StatusReport {
            total,
            active: total.saturating_sub(deleted),
            deleted,
            by_source,
            ambiguous_pending,
        })
    }

    /// Count rows breaking the "deleted exactly when unclaimed" rule.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if either count query fails.
    pub async fn verify(&self) -> Result<VerifyReport, DatabaseError> {
        let conn = self.conn();
        let unclaimed_but_active = query_count(
            conn,
            "SELECT COUNT(*) FROM systems WHERE action_flags = 0 AND deleted_at IS NULL",
            (),
        )
        .await?;
        let claimed_but_deleted = query_count(
            conn,
            "SELECT COUNT(*) FROM systems WHERE action_flags != 0 AND deleted_at IS NOT NULL",
            (),
        )
        .await?;
        Ok(VerifyReport {
            unclaimed_but_active,
            claimed_but_deleted,
        })
    }
}
