//! Coordinate resolution pipeline.
//!
//! A driver task keeps at most `workers` resolver calls in flight on the
//! blocking pool and forwards each placed system into a bounded channel.
//! Each call holds a semaphore permit until the resolver actually returns, so
//! a call abandoned on timeout still occupies its worker slot.
//! The consumer sees a [`ResolvedStream`]: finite, unordered, consumed once.
//! A name that fails, times out or resolves to an invalid record produces no
//! output; the rest of the run carries on.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use rse_core::{ResolvedSystem, WorkingSetEntry};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::resolver::Resolver;

/// Pipeline tuning.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Resolver calls in flight at once.
    pub workers: usize,
    /// Resolved records buffered ahead of the consumer.
    pub output_capacity: usize,
    /// Per-name resolver timeout.
    pub resolve_timeout: Duration,
    /// Place unresolved entries from the dump's own estimate.
    pub use_dump_estimates: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            output_capacity: 1024,
            resolve_timeout: Duration::from_secs(5),
            use_dump_estimates: false,
        }
    }
}

/// Counters shared between the driver and the stream.
#[derive(Debug, Default)]
pub struct PipelineStats {
    resolved: AtomicUsize,
    unresolved: AtomicUsize,
}

impl PipelineStats {
    /// Records emitted, including those placed from estimates.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::Relaxed)
    }

    /// Entries dropped: unknown, failed, timed out or invalid.
    #[must_use]
    pub fn unresolved(&self) -> usize {
        self.unresolved.load(Ordering::Relaxed)
    }
}

/// Fixed-size worker pool over a [`Resolver`].
#[derive(Clone)]
pub struct ResolutionPipeline {
    resolver: Arc<dyn Resolver>,
    settings: PipelineSettings,
}

impl ResolutionPipeline {
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolver>, settings: PipelineSettings) -> Self {
        Self { resolver, settings }
    }

    /// Start resolving `entries`. Must be called within a Tokio runtime.
    #[must_use]
    pub fn resolve(&self, entries: Vec<WorkingSetEntry>) -> ResolvedStream {
        let (tx, rx) = mpsc::channel(self.settings.output_capacity.max(1));
        let stats = Arc::new(PipelineStats::default());
        tracing::info!(
            entries = entries.len(),
            workers = self.settings.workers,
            "resolving working set"
        );
        tokio::spawn(drive(
            Arc::clone(&self.resolver),
            self.settings,
            entries,
            tx,
            Arc::clone(&stats),
        ));
        ResolvedStream { rx, stats }
    }
}

async fn drive(
    resolver: Arc<dyn Resolver>,
    settings: PipelineSettings,
    entries: Vec<WorkingSetEntry>,
    tx: mpsc::Sender<ResolvedSystem>,
    stats: Arc<PipelineStats>,
) {
    let workers = settings.workers.max(1);
    let slots = Arc::new(Semaphore::new(workers));
    let mut queue = entries.into_iter();
    let mut in_flight = JoinSet::new();

    loop {
        while in_flight.len() < workers {
            let Some(entry) = queue.next() else { break };
            in_flight.spawn(resolve_one(
                Arc::clone(&resolver),
                Arc::clone(&slots),
                settings,
                entry,
            ));
        }
        let Some(joined) = in_flight.join_next().await else {
            break;
        };
        let system = match joined {
            Ok(Some(system)) => system,
            Ok(None) => {
                stats.unresolved.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "resolver task failed");
                stats.unresolved.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };
        stats.resolved.fetch_add(1, Ordering::Relaxed);
        if tx.send(system).await.is_err() {
            tracing::debug!("resolved stream dropped, stopping resolution");
            in_flight.abort_all();
            return;
        }
    }
}

/// Resolve one entry, falling back to its estimate when allowed.
async fn resolve_one(
    resolver: Arc<dyn Resolver>,
    slots: Arc<Semaphore>,
    settings: PipelineSettings,
    entry: WorkingSetEntry,
) -> Option<ResolvedSystem> {
    // The semaphore is never closed.
    let Ok(permit) = slots.acquire_owned().await else {
        return None;
    };
    let name = entry.name.clone();
    let call = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        resolver.resolve(&name)
    });

    let resolved = match tokio::time::timeout(settings.resolve_timeout, call).await {
        Ok(Ok(Ok(Some(system)))) => Some(system),
        Ok(Ok(Ok(None))) => {
            tracing::debug!(name = %entry.name, "resolver does not know this system");
            None
        }
        Ok(Ok(Err(e))) => {
            tracing::warn!(name = %entry.name, error = %e, "resolution failed, dropping");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!(name = %entry.name, error = %e, "resolver panicked, dropping");
            None
        }
        Err(_) => {
            tracing::warn!(
                name = %entry.name,
                timeout = ?settings.resolve_timeout,
                "resolution timed out, dropping"
            );
            None
        }
    };

    let resolved = match resolved {
        Some(system) => system,
        None if settings.use_dump_estimates => {
            let estimate = ResolvedSystem::from_estimate(&entry)?;
            tracing::debug!(name = %entry.name, "placed from dump estimate");
            estimate
        }
        None => return None,
    };

    match resolved.validate() {
        Ok(system) => Some(system),
        Err(e) => {
            tracing::warn!(error = %e, "resolver returned an invalid record, dropping");
            None
        }
    }
}

/// Lazy, unordered sequence of resolved systems.
pub struct ResolvedStream {
    rx: mpsc::Receiver<ResolvedSystem>,
    stats: Arc<PipelineStats>,
}

impl ResolvedStream {
    /// Next resolved system, or `None` once every entry has been processed.
    pub async fn next(&mut self) -> Option<ResolvedSystem> {
        self.rx.recv().await
    }

    #[must_use]
    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }
}

impl Stream for ResolvedStream {
    type Item = ResolvedSystem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
