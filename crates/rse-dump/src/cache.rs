//! Staleness-aware download of the dump into a local cache file.
//!
//! The body is streamed into `<cache>.part` and renamed over the cache path
//! only after the last chunk is flushed, so an interrupted download never
//! leaves a truncated dump where the loader would find it.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::io::AsyncWriteExt;

use crate::error::DumpError;
use crate::http::check_response;

/// What [`DumpCache::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The cached file is younger than the TTL and was reused.
    Fresh,
    /// A new copy was downloaded.
    Downloaded { bytes: u64 },
}

/// A remote feed mirrored to a local file.
#[derive(Debug, Clone)]
pub struct DumpCache {
    url: String,
    path: PathBuf,
    ttl: Duration,
}

impl DumpCache {
    #[must_use]
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            ttl,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cached copy is missing or older than the TTL at `now`.
    #[must_use]
    pub fn is_stale(&self, now: SystemTime) -> bool {
        let Ok(modified) = std::fs::metadata(&self.path).and_then(|m| m.modified()) else {
            return true;
        };
        now.duration_since(modified)
            .is_ok_and(|age| age > self.ttl)
    }

    /// Download the feed if the cached copy is stale.
    ///
    /// # Errors
    ///
    /// Returns `DumpError` if the request fails, the server answers with a
    /// non-success status, or the cache file cannot be written.
    pub async fn refresh(&self, client: &reqwest::Client) -> Result<FetchOutcome, DumpError> {
        if !self.is_stale(SystemTime::now()) {
            tracing::info!(path = %self.path.display(), "dump cache is fresh, skipping download");
            return Ok(FetchOutcome::Fresh);
        }
        self.download(client).await
    }

    /// Download the feed unconditionally.
    ///
    /// # Errors
    ///
    /// See [`DumpCache::refresh`].
    pub async fn download(&self, client: &reqwest::Client) -> Result<FetchOutcome, DumpError> {
        tracing::info!(url = %self.url, path = %self.path.display(), "downloading dump");
        let part = self.part_path();
        match self.stream_to(client, &part).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, &self.path)
                    .await
                    .map_err(|e| DumpError::io(&self.path, e))?;
                tracing::info!(bytes, "dump downloaded");
                Ok(FetchOutcome::Downloaded { bytes })
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    async fn stream_to(&self, client: &reqwest::Client, part: &Path) -> Result<u64, DumpError> {
        let mut resp = check_response(client.get(&self.url).send().await?).await?;

        if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DumpError::io(parent, e))?;
        }
        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| DumpError::io(part, e))?;

        let mut bytes = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| DumpError::io(part, e))?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| DumpError::io(part, e))?;
        Ok(bytes)
    }

    fn part_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }
}
