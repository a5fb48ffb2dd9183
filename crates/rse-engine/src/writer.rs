//! Batch writer: the single task that commits to the catalog.
//!
//! Producers hold a [`BatchSender`], which groups records into batches of
//! `batch_size` and hands them over a channel of `queue_capacity` batches.
//! A full channel blocks the producer, so at most
//! `(queue_capacity + 2) * batch_size` records are held in memory: the queued
//! batches, the one being committed, and the one being filled.
//!
//! The writer task owns the [`CatalogDb`] for its whole life and commits each
//! batch as one transaction. Closing the sender ends the task, which hands
//! the catalog back through [`WriterHandle::finish`].

use chrono::{DateTime, Utc};
use rse_core::{ResolvedSystem, Source};
use rse_db::CatalogDb;
use rse_db::retry::{RetryConfig, with_retry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::EngineError;

/// Writer tuning and the run context stamped on every row.
#[derive(Debug, Clone, Copy)]
pub struct WriterSettings {
    pub source: Source,
    pub batch_size: usize,
    pub queue_capacity: usize,
    /// Run timestamp used for `created_at`, `updated_at` and `deleted_at`.
    pub now: DateTime<Utc>,
}

/// One unit of work for the writer; committed atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteBatch {
    Upsert(Vec<ResolvedSystem>),
    Retire(Vec<u64>),
}

/// Running totals of committed work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub batches: u64,
    pub upserted: u64,
    pub retired: u64,
    pub soft_deleted: u64,
}

/// Called after every commit with the totals so far.
pub type CommitHook = Box<dyn FnMut(&WriteStats) + Send>;

/// Entry point for spawning the writer task.
pub struct BatchWriter;

impl BatchWriter {
    /// Spawn the writer task, moving `db` into it.
    #[must_use]
    pub fn spawn(
        db: CatalogDb,
        settings: WriterSettings,
        on_commit: Option<CommitHook>,
    ) -> (BatchSender, WriterHandle) {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let join = tokio::spawn(run_writer(db, settings, rx, on_commit));
        (
            BatchSender::new(tx, settings.batch_size),
            WriterHandle { join },
        )
    }
}

async fn run_writer(
    db: CatalogDb,
    settings: WriterSettings,
    mut rx: mpsc::Receiver<WriteBatch>,
    mut on_commit: Option<CommitHook>,
) -> Result<(CatalogDb, WriteStats), EngineError> {
    let retry = RetryConfig::default();
    let mut stats = WriteStats::default();

    while let Some(batch) = rx.recv().await {
        match &batch {
            WriteBatch::Upsert(systems) => {
                let db = &db;
                let written = with_retry(&retry, || {
                    db.commit_upserts(systems, settings.source, settings.now)
                })
                .await?;
                stats.upserted += written;
                tracing::debug!(batch = stats.batches + 1, records = written, "upsert batch committed");
            }
            WriteBatch::Retire(ids) => {
                let db = &db;
                let outcome = with_retry(&retry, || {
                    db.commit_retirements(ids, settings.source, settings.now)
                })
                .await?;
                stats.retired += outcome.retired;
                stats.soft_deleted += outcome.soft_deleted;
                tracing::debug!(
                    batch = stats.batches + 1,
                    retired = outcome.retired,
                    soft_deleted = outcome.soft_deleted,
                    "retire batch committed"
                );
            }
        }
        stats.batches += 1;
        if let Some(hook) = on_commit.as_mut() {
            hook(&stats);
        }
    }

    tracing::info!(
        batches = stats.batches,
        upserted = stats.upserted,
        retired = stats.retired,
        soft_deleted = stats.soft_deleted,
        source = %settings.source,
        "writer finished"
    );
    Ok((db, stats))
}

/// Producer side: accumulates records and enqueues full batches.
pub struct BatchSender {
    tx: mpsc::Sender<WriteBatch>,
    buffer: Vec<ResolvedSystem>,
    batch_size: usize,
}

impl BatchSender {
    fn new(tx: mpsc::Sender<WriteBatch>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            tx,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    /// Add one record, enqueuing the batch once it is full. Waits while the
    /// queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WriterClosed`] if the writer has stopped;
    /// [`WriterHandle::finish`] then reports why.
    pub async fn push(&mut self, system: ResolvedSystem) -> Result<(), EngineError> {
        self.buffer.push(system);
        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Enqueue retirements for `ids`, chunked by the batch size. Pending
    /// upserts are flushed first so they commit ahead of the retirements.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WriterClosed`] if the writer has stopped.
    pub async fn retire(&mut self, ids: &[u64]) -> Result<(), EngineError> {
        self.flush().await?;
        for chunk in ids.chunks(self.batch_size) {
            self.send(WriteBatch::Retire(chunk.to_vec())).await?;
        }
        Ok(())
    }

    /// Enqueue the final partial batch and close the queue.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WriterClosed`] if the writer has stopped.
    pub async fn close(mut self) -> Result<(), EngineError> {
        self.flush().await
    }

    async fn flush(&mut self) -> Result<(), EngineError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        self.send(WriteBatch::Upsert(batch)).await
    }

    async fn send(&self, batch: WriteBatch) -> Result<(), EngineError> {
        self.tx
            .send(batch)
            .await
            .map_err(|_| EngineError::WriterClosed)
    }
}

/// Join handle for the writer task.
pub struct WriterHandle {
    join: JoinHandle<Result<(CatalogDb, WriteStats), EngineError>>,
}

impl WriterHandle {
    /// Wait for the writer to drain the queue and return the catalog.
    ///
    /// # Errors
    ///
    /// Returns the commit error that stopped the writer, or
    /// [`EngineError::WriterTask`] if the task panicked.
    pub async fn finish(self) -> Result<(CatalogDb, WriteStats), EngineError> {
        self.join.await?
    }
}
