//! Shared HTTP helpers for feed downloads.

use std::time::Duration;

use crate::error::DumpError;

/// Build a client whose every request is bounded by `timeout`.
///
/// # Errors
///
/// Returns `DumpError::Http` if the TLS backend cannot be initialised.
pub fn client(timeout: Duration) -> Result<reqwest::Client, DumpError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("rse/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

/// Check an HTTP response for a non-success status.
///
/// Returns the response unchanged on success, otherwise
/// [`DumpError::Status`] carrying the status code and response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DumpError> {
    if !resp.status().is_success() {
        return Err(DumpError::Status {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}
