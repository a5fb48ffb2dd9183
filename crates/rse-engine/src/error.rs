//! Engine error types.

use std::path::PathBuf;

use rse_db::error::DatabaseError;
use thiserror::Error;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A catalog read or batch commit failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The exclusion prefixes did not compile into a matcher.
    #[error("invalid exclusion pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A list or table file could not be read.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The known-systems table is malformed.
    #[error("known-systems table {path}: {reason}")]
    Table { path: PathBuf, reason: String },

    /// The writer task stopped before the producer finished.
    #[error("batch writer stopped early")]
    WriterClosed,

    /// The writer task panicked or was cancelled.
    #[error("batch writer task failed: {0}")]
    WriterTask(#[from] tokio::task::JoinError),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single name could not be resolved. Never fatal to a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// More than one known identity carries this name.
    #[error("{name} matches {count} known systems")]
    Ambiguous { name: String, count: usize },

    /// The resolver backend failed for this name.
    #[error("resolver failed for {name}: {reason}")]
    Failed { name: String, reason: String },
}
