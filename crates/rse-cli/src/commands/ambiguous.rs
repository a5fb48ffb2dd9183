use rse_config::RseConfig;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `rse ambiguous`.
pub async fn handle(config: &RseConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let db = super::open_catalog(config).await?;
    let pending = db.list_ambiguous().await?;
    output(&pending, flags.format)
}
