use rse_config::RseConfig;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `rse verify`. Exits non-zero when any row breaks the soft-delete rule.
pub async fn handle(config: &RseConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let db = super::open_catalog(config).await?;
    let report = db.verify().await?;
    output(&report, flags.format)?;

    if !report.is_clean() {
        anyhow::bail!(
            "catalog is inconsistent: {} unclaimed rows still active, {} claimed rows marked deleted",
            report.unclaimed_but_active,
            report.claimed_but_deleted
        );
    }
    Ok(())
}
