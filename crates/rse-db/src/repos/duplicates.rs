//! Names that matched several known identities.
//!
//! These are never written to `systems`; they are parked here so an operator
//! can decide which identity is meant.

use chrono::{DateTime, Utc};
use rse_core::AmbiguousEntry;

use crate::CatalogDb;
use crate::error::DatabaseError;

impl CatalogDb {
    /// Record a set of ambiguous names. A name seen before keeps its
    /// `first_seen_at` and has its candidates and `last_seen_at` refreshed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if serialization or any statement fails.
    pub async fn record_ambiguous(
        &self,
        entries: &[AmbiguousEntry],
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        if entries.is_empty() {
            return Ok(0);
        }
        let now = now.to_rfc3339();
        let tx = self.conn().transaction().await?;
        for entry in entries {
            let candidates = serde_json::to_string(&entry.candidate_ids)?;
            tx.execute(
                "INSERT INTO duplicates (name, candidate_ids, first_seen_at, last_seen_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(name) DO UPDATE SET
                    candidate_ids = excluded.candidate_ids,
                    last_seen_at = excluded.last_seen_at",
                libsql::params![entry.name.as_str(), candidates, now.as_str()],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(entries.len() as u64)
    }

    /// All parked ambiguous names, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a stored candidate list
    /// is malformed.
    pub async fn list_ambiguous(&self) -> Result<Vec<AmbiguousEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT name, candidate_ids FROM duplicates ORDER BY name", ())
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw = row.get::<String>(1)?;
            let candidate_ids = serde_json::from_str(&raw)?;
            entries.push(AmbiguousEntry {
                name: row.get::<String>(0)?,
                candidate_ids,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use crate::test_support::test_db;

    use super::*;

    fn entry(name: &str, ids: &[u64]) -> AmbiguousEntry {
        AmbiguousEntry {
            name: name.into(),
            candidate_ids: ids.to_vec(),
        }
    }

    #[tokio::test]
    async fn records_and_refreshes_names() {
        let db = test_db().await;
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();

        db.record_ambiguous(&[entry("Sol", &[1, 2])], first).await.unwrap();
        db.record_ambiguous(&[entry("Sol", &[1, 2, 3]), entry("Achenar", &[9, 10])], second)
            .await
            .unwrap();

        let listed = db.list_ambiguous().await.unwrap();
        assert_eq!(listed, vec![entry("Achenar", &[9, 10]), entry("Sol", &[1, 2, 3])]);

        let mut rows = db
            .conn()
            .query("SELECT first_seen_at, last_seen_at FROM duplicates WHERE name = 'Sol'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), first.to_rfc3339());
        assert_eq!(row.get::<String>(1).unwrap(), second.to_rfc3339());
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let db = test_db().await;
        assert_eq!(db.record_ambiguous(&[], Utc::now()).await.unwrap(), 0);
        assert!(db.list_ambiguous().await.unwrap().is_empty());
    }
}
