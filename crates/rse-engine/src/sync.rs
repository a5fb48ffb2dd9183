//! Run orchestration.
//!
//! A main-dump run filters the dump, then either rebuilds the catalog from
//! scratch (fresh install, or `force_full`) or reconciles it incrementally.
//! A beacon run reconciles the beacon names under their own source bit.
//! Both hand the catalog to the batch writer for the duration of the write
//! phase and get it back afterwards.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rse_core::responses::{RunMode, RunReport};
use rse_core::{AmbiguousEntry, DumpRecord, Source, WorkingSetEntry};
use rse_db::CatalogDb;

use crate::error::EngineError;
use crate::filter::FilterEngine;
use crate::pipeline::{PipelineSettings, ResolutionPipeline, ResolvedStream};
use crate::reconcile::{self, ActiveSet, ApplyOutcome};
use crate::resolver::Resolver;
use crate::writer::{BatchWriter, CommitHook, WriteStats, WriterSettings};

/// Tuning for a whole run.
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub pipeline: PipelineSettings,
    pub batch_size: usize,
    pub queue_capacity: usize,
    /// Delay before the single retry of a failed catalog probe.
    pub probe_retry_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            pipeline: PipelineSettings::default(),
            batch_size: 10_000,
            queue_capacity: 4,
            probe_retry_delay: Duration::from_millis(500),
        }
    }
}

/// Catalog handed back after a run, with the run's counters.
pub struct SyncOutcome {
    pub db: CatalogDb,
    pub report: RunReport,
}

/// Filter, resolver pool and write settings wired together.
pub struct Synchronizer {
    filter: FilterEngine,
    pipeline: ResolutionPipeline,
    settings: SyncSettings,
}

impl Synchronizer {
    #[must_use]
    pub fn new(filter: FilterEngine, resolver: Arc<dyn Resolver>, settings: SyncSettings) -> Self {
        Self {
            filter,
            pipeline: ResolutionPipeline::new(resolver, settings.pipeline),
            settings,
        }
    }

    /// Synchronize the catalog with a fully parsed main dump.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a catalog read or batch commit fails. The
    /// catalog keeps every batch committed before the failure.
    pub async fn sync_dump(
        &self,
        db: CatalogDb,
        records: Vec<DumpRecord>,
        force_full: bool,
        now: DateTime<Utc>,
        on_commit: Option<CommitHook>,
    ) -> Result<SyncOutcome, EngineError> {
        let source = Source::MainDump;
        let mut report = RunReport {
            source: Some(source),
            read: records.len(),
            ..RunReport::default()
        };

        let filtered = self.filter.admit(records);
        report.excluded_by_pattern = filtered.excluded_by_pattern;
        report.excluded_by_name = filtered.excluded_by_name;
        report.admitted = filtered.admitted.len();
        report.ambiguous = filtered.ambiguous.len();
        db.record_ambiguous(&filtered.ambiguous, now).await?;

        let full = force_full || !db.is_present_and_valid(self.settings.probe_retry_delay).await;
        let (stream, retire_candidates) = if full {
            tracing::info!(forced = force_full, "building catalog from scratch");
            report.mode = Some(RunMode::FullBuild);
            db.reset_systems().await?;
            (self.pipeline.resolve(filtered.admitted), HashSet::new())
        } else {
            tracing::info!("reconciling catalog incrementally");
            report.mode = Some(RunMode::Incremental);
            let active = ActiveSet::from_rows(db.active_rows(source).await?);
            let plan = reconcile::plan(filtered.admitted, &active);
            report.unchanged = plan.unchanged;
            (self.pipeline.resolve(plan.to_resolve), plan.retire_candidates)
        };

        self.write_phase(db, source, now, stream, retire_candidates, on_commit, report)
            .await
    }

    /// Reconcile the beacon feed under its own source bit.
    ///
    /// Procedural names are resolved as they are; other names need exactly
    /// one known identity. An empty feed changes nothing, so a broken
    /// download cannot retire every beacon.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a catalog read or batch commit fails.
    pub async fn sync_beacons(
        &self,
        db: CatalogDb,
        names: Vec<String>,
        now: DateTime<Utc>,
        on_commit: Option<CommitHook>,
    ) -> Result<SyncOutcome, EngineError> {
        let source = Source::NavBeacon;
        let mut report = RunReport {
            mode: Some(RunMode::Incremental),
            source: Some(source),
            read: names.len(),
            ..RunReport::default()
        };

        let (working_set, ambiguous, unknown) = self.beacon_working_set(names);
        report.admitted = working_set.len();
        report.ambiguous = ambiguous.len();
        report.unresolved = unknown;
        db.record_ambiguous(&ambiguous, now).await?;

        if working_set.is_empty() {
            tracing::warn!("beacon feed yielded no usable systems, leaving beacon claims untouched");
            return Ok(SyncOutcome { db, report });
        }

        let active = ActiveSet::from_rows(db.active_rows(source).await?);
        let plan = reconcile::plan(working_set, &active);
        report.unchanged = plan.unchanged;
        let stream = self.pipeline.resolve(plan.to_resolve);

        self.write_phase(db, source, now, stream, plan.retire_candidates, on_commit, report)
            .await
    }

    fn beacon_working_set(
        &self,
        names: Vec<String>,
    ) -> (Vec<WorkingSetEntry>, Vec<AmbiguousEntry>, usize) {
        let lookup = self.filter.lookup();
        let mut working_set = Vec::new();
        let mut ambiguous = Vec::new();
        let mut unknown = 0;

        for name in names {
            if lookup.is_procedural(&name) {
                working_set.push(WorkingSetEntry::named(name));
                continue;
            }
            let known = lookup.known_ids(&name);
            match known.len() {
                0 => {
                    tracing::debug!(%name, "beacon system has no known identity, skipping");
                    unknown += 1;
                }
                1 => working_set.push(WorkingSetEntry::named(name).with_id(known[0])),
                _ => {
                    tracing::warn!(
                        %name,
                        candidates = ?known,
                        "ambiguous beacon system, excluded for manual review"
                    );
                    ambiguous.push(AmbiguousEntry {
                        name,
                        candidate_ids: known,
                    });
                }
            }
        }
        (working_set, ambiguous, unknown)
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_phase(
        &self,
        db: CatalogDb,
        source: Source,
        now: DateTime<Utc>,
        stream: ResolvedStream,
        retire_candidates: HashSet<u64>,
        on_commit: Option<CommitHook>,
        mut report: RunReport,
    ) -> Result<SyncOutcome, EngineError> {
        let stats = stream.stats();
        let (mut sender, handle) = BatchWriter::spawn(
            db,
            WriterSettings {
                source,
                batch_size: self.settings.batch_size,
                queue_capacity: self.settings.queue_capacity,
                now,
            },
            on_commit,
        );

        let produced = match reconcile::apply(stream, retire_candidates, &mut sender).await {
            Ok(outcome) => sender.close().await.map(|()| outcome),
            Err(e) => {
                drop(sender);
                Err(e)
            }
        };
        // The writer's own error explains a closed queue, so it wins.
        let (db, written) = handle.finish().await?;
        let applied: ApplyOutcome = produced?;

        report.resolved = stats.resolved();
        report.unresolved += stats.unresolved();
        fill_write_counts(&mut report, &written);
        tracing::info!(
            source = %source,
            resolved = applied.resolved,
            retire_candidates = applied.retired_requested,
            "run complete"
        );
        Ok(SyncOutcome { db, report })
    }
}

const fn fill_write_counts(report: &mut RunReport, written: &WriteStats) {
    report.inserted_or_updated = written.upserted;
    report.retired = written.retired;
    report.soft_deleted = written.soft_deleted;
    report.batches_committed = written.batches;
}
