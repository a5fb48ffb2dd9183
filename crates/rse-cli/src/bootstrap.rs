use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use rse_config::RseConfig;
use rse_engine::{PipelineSettings, SyncSettings};

use crate::cli::GlobalFlags;

pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<RseConfig> {
    load_dotenv(flags.config.as_deref())?;
    RseConfig::load(flags.config.as_deref()).context("failed to load rse configuration")
}

/// Prefer a `.env` beside an explicit config file, then the working directory.
fn load_dotenv(config_file: Option<&Path>) -> anyhow::Result<()> {
    if let Some(dir) = config_file.and_then(Path::parent) {
        let env_path = dir.join(".env");
        if env_path.is_file() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
            return Ok(());
        }
    }

    dotenvy::dotenv().ok();
    Ok(())
}

/// Map the `pipeline` and `database` sections onto engine tuning.
#[must_use]
pub fn sync_settings(config: &RseConfig) -> SyncSettings {
    let pipeline = &config.pipeline;
    SyncSettings {
        pipeline: PipelineSettings {
            workers: pipeline.workers,
            output_capacity: pipeline.batch_size,
            resolve_timeout: Duration::from_millis(pipeline.resolve_timeout_ms),
            use_dump_estimates: pipeline.use_dump_estimates,
        },
        batch_size: pipeline.batch_size,
        queue_capacity: pipeline.queue_capacity,
        probe_retry_delay: Duration::from_millis(config.database.probe_retry_delay_ms),
    }
}
