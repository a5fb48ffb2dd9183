use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use rse_config::RseConfig;
use rse_dump::BeaconLayout;

use crate::cli::GlobalFlags;
use crate::output::output;
use crate::progress::Progress;

/// Handle `rse beacons`.
pub async fn handle(config: &RseConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let now = Utc::now();
    let beacons = config.require_beacons()?;
    let progress = Progress::spinner("fetching beacon feed");

    let client = rse_dump::http::client(Duration::from_secs(beacons.timeout_secs))?;
    let layout = BeaconLayout {
        header_rows: beacons.header_rows,
        name_column: beacons.name_column,
    };
    let names = match rse_dump::fetch_beacon_names(&client, &beacons.url, layout).await {
        Ok(names) => names,
        Err(error) => {
            progress.finish_err("beacon feed failed");
            return Err(error).context("failed to fetch the beacon feed");
        }
    };

    progress.set_message("loading known systems");
    let synchronizer = super::synchronizer(config).await?;
    let db = super::open_catalog(config).await?;

    progress.set_message(format!("reconciling {} beacon systems", names.len()));
    let outcome = synchronizer
        .sync_beacons(db, names, now, Some(super::commit_progress(&progress)))
        .await
        .inspect_err(|_| progress.finish_err("beacon sync failed"))
        .context("beacon sync failed; committed batches are kept")?;

    progress.finish_clear();
    output(&outcome.report, flags.format)
}
