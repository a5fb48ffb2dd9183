use rse_config::RseConfig;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `rse status`.
pub async fn handle(config: &RseConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let db = super::open_catalog(config).await?;
    let report = db.status().await?;
    output(&report, flags.format)
}
