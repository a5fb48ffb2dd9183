use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use rse_config::RseConfig;
use rse_dump::{DumpCache, FetchOutcome};

use crate::cli::{GlobalFlags, SyncArgs};
use crate::output::output;
use crate::progress::Progress;

/// Handle `rse sync`.
pub async fn handle(args: &SyncArgs, config: &RseConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let now = Utc::now();
    let progress = Progress::spinner("checking systems dump");

    let cache = DumpCache::new(
        config.dump.url.clone(),
        &config.dump.cache_path,
        Duration::from_secs(config.dump.ttl_secs),
    );
    if args.skip_download {
        tracing::info!(path = %cache.path().display(), "using cached dump without checking age");
    } else {
        let client = rse_dump::http::client(Duration::from_secs(config.dump.timeout_secs))?;
        progress.set_message("downloading systems dump");
        match cache.refresh(&client).await {
            Ok(FetchOutcome::Fresh) => tracing::info!("cached dump is fresh"),
            Ok(FetchOutcome::Downloaded { bytes }) => tracing::info!(bytes, "dump downloaded"),
            Err(error) => {
                progress.finish_err("dump download failed");
                return Err(error).context("failed to refresh the systems dump");
            }
        }
    }

    progress.set_message("loading systems dump");
    let records = rse_dump::load_dump(cache.path())
        .await
        .with_context(|| format!("failed to load dump from {}", cache.path().display()))?;

    progress.set_message("loading known systems");
    let synchronizer = super::synchronizer(config).await?;
    let db = super::open_catalog(config).await?;

    progress.set_message(format!("synchronizing {} dump records", records.len()));
    let result = synchronizer
        .sync_dump(db, records, args.full, now, Some(super::commit_progress(&progress)))
        .await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(error) => {
            progress.finish_err("sync failed");
            return Err(error).context("catalog sync failed; committed batches are kept");
        }
    };

    progress.finish_clear();
    output(&outcome.report, flags.format)
}
