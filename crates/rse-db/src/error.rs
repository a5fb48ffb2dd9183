//! Catalog error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A statement ran but its input or output could not be converted.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A count or lookup expected exactly one row.
    #[error("No result returned")]
    NoResult,

    /// A stored value violates the catalog's column rules (negative count,
    /// out-of-range uncertainty, unreadable candidate list).
    #[error("Invalid catalog value: {0}")]
    InvalidState(String),

    #[error("candidate id list is not valid JSON: {0}")]
    CandidateIds(#[from] serde_json::Error),

    /// Underlying libSQL error. Busy/locked variants are retried by
    /// [`crate::retry::with_retry`].
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
