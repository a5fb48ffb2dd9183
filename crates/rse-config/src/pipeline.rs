//! Resolution and write pipeline tuning.

use serde::{Deserialize, Serialize};

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

const fn default_batch_size() -> usize {
    10_000
}

const fn default_queue_capacity() -> usize {
    4
}

const fn default_resolve_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Resolver worker count.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Records per committed transaction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batches that may wait for the writer before producers block.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-name resolver timeout.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Fall back to the dump's estimated coordinates when the resolver
    /// cannot place a system that carries an id.
    #[serde(default)]
    pub use_dump_estimates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            use_dump_estimates: false,
        }
    }
}
