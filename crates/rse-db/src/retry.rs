//! Transient error retry logic.
//!
//! `SQLite` reports lock contention (another process holding the catalog, a
//! checkpoint in progress) as errors that resolve on their own within
//! moments. Those are retried with exponential backoff; every other error is
//! returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::DatabaseError;

/// Configuration for retry behavior on transient errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// One initial attempt plus a single retry after `delay`.
    #[must_use]
    pub const fn once(delay: Duration) -> Self {
        Self {
            max_attempts: 2,
            base_delay: delay,
            max_delay: delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Detect lock-contention errors that are worth retrying.
///
/// The predicate is intentionally narrow to avoid retrying genuine
/// SQL or constraint errors.
pub fn is_transient_error(e: &DatabaseError) -> bool {
    let DatabaseError::LibSql(inner) = e else {
        return false;
    };
    let msg = inner.to_string().to_ascii_lowercase();
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("sqlite_busy")
}

/// Run `op`, retrying while it fails with a transient error.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, DatabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DatabaseError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts && is_transient_error(&e) => {
                let delay = config.delay_for(attempt);
                tracing::warn!(attempt, ?delay, error = %e, "transient database error, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
