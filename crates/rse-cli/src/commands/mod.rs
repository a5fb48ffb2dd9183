use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rse_config::RseConfig;
use rse_db::CatalogDb;
use rse_engine::{
    CommitHook, ExclusionList, FilterEngine, IdentityLookup, Synchronizer, TableResolver, WriteStats,
};

use crate::bootstrap;
use crate::cli::{Commands, GlobalFlags};
use crate::progress::Progress;

pub mod ambiguous;
pub mod beacons;
pub mod status;
pub mod sync;
pub mod verify;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    config: &RseConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Sync(args) => sync::handle(&args, config, flags).await,
        Commands::Beacons => beacons::handle(config, flags).await,
        Commands::Status => status::handle(config, flags).await,
        Commands::Verify => verify::handle(config, flags).await,
        Commands::Ambiguous => ambiguous::handle(config, flags).await,
    }
}

async fn open_catalog(config: &RseConfig) -> anyhow::Result<CatalogDb> {
    let database = config.require_database()?;
    CatalogDb::open_local(&database.path)
        .await
        .with_context(|| format!("failed to open catalog at {}", database.path))
}

/// Known-systems table, exclusion lists and pipeline tuning wired together.
async fn synchronizer(config: &RseConfig) -> anyhow::Result<Synchronizer> {
    let table_path = PathBuf::from(&config.require_resolver()?.known_systems_path);
    let permit_path = PathBuf::from(&config.filters.permit_sectors_path);
    let filter_path = PathBuf::from(&config.filters.system_filter_path);

    let (resolver, prefixes, names) = tokio::task::spawn_blocking(move || {
        let resolver = TableResolver::load(&table_path)
            .with_context(|| format!("failed to load known systems from {}", table_path.display()))?;
        let prefixes = ExclusionList::load(&permit_path)?;
        let names = ExclusionList::load(&filter_path)?;
        anyhow::Ok((resolver, prefixes, names))
    })
    .await??;

    tracing::info!(
        known_names = resolver.len(),
        excluded_prefixes = prefixes.len(),
        excluded_names = names.len(),
        "resolver and filters loaded"
    );

    let resolver = Arc::new(resolver);
    let lookup: Arc<dyn IdentityLookup> = resolver.clone();
    let filter = FilterEngine::new(&prefixes, &names, lookup)?;
    Ok(Synchronizer::new(filter, resolver, bootstrap::sync_settings(config)))
}

/// Reports commit progress on the spinner.
fn commit_progress(progress: &Progress) -> CommitHook {
    let progress = progress.clone();
    Box::new(move |stats: &WriteStats| {
        progress.set_message(format!(
            "{} batches committed ({} written, {} retired)",
            stats.batches, stats.upserted, stats.retired
        ));
    })
}
