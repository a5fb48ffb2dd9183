//! Transport error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while fetching or parsing a feed.
#[derive(Debug, Error)]
pub enum DumpError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("download failed ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Reading or writing a local file failed.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dump is corrupt or truncated.
    #[error("malformed dump {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The beacon CSV could not be read.
    #[error("beacon feed: {0}")]
    Csv(#[from] csv::Error),

    /// A blocking parse task panicked or was cancelled.
    #[error("loader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DumpError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
