//! End-to-end runs against an in-memory catalog and a known-systems table.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use rse_core::responses::RunMode;
use rse_core::{DumpRecord, EstimatedPosition, Source};
use rse_db::CatalogDb;
use rse_engine::{
    CommitHook, EngineError, ExclusionList, FilterEngine, PipelineSettings, SyncSettings, Synchronizer,
    TableResolver,
};

const KNOWN: &str = r#"{"name":"Sol","id64":10,"x":0,"y":0,"z":0}
{"name":"Achenar","id64":11,"x":67.5,"y":-119.47,"z":24.84}
{"name":"Lave","id64":12,"x":75.75,"y":48.75,"z":70.75,"uncertainty":3}
{"name":"Hyades Sector X","id64":20,"x":1,"y":1,"z":1}
{"name":"Hyades Sector X","id64":21,"x":2,"y":2,"z":2}
{"name":"Eol Prou RS-T d3-94","id64":30,"x":-9530.5,"y":-910.28,"z":19808.13,"uncertainty":40}
"#;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, day, 6, 0, 0).unwrap()
}

fn record(name: &str, id: Option<u64>) -> DumpRecord {
    DumpRecord {
        name: name.into(),
        id,
        estimated: None,
    }
}

fn synchronizer(prefixes: &str, names: &str) -> Synchronizer {
    let mut table = tempfile::NamedTempFile::new().unwrap();
    table.write_all(KNOWN.as_bytes()).unwrap();
    let resolver = Arc::new(TableResolver::load(table.path()).unwrap());

    let filter = FilterEngine::new(
        &ExclusionList::from_lines(prefixes),
        &ExclusionList::from_lines(names),
        resolver.clone(),
    )
    .unwrap();
    Synchronizer::new(
        filter,
        resolver,
        SyncSettings {
            pipeline: PipelineSettings {
                workers: 2,
                output_capacity: 4,
                resolve_timeout: Duration::from_secs(5),
                use_dump_estimates: false,
            },
            batch_size: 2,
            queue_capacity: 1,
            probe_retry_delay: Duration::ZERO,
        },
    )
}

async fn empty_catalog() -> CatalogDb {
    CatalogDb::open_local(":memory:").await.unwrap()
}

// ---------------------------------------------------------------------------
// Main dump
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_commit_aborts_the_run_with_the_database_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let path = path.to_str().unwrap();

    let db = CatalogDb::open_local(path).await.unwrap();
    db.conn()
        .execute(
            "CREATE TRIGGER reject_lave BEFORE INSERT ON systems WHEN NEW.id = 12
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            (),
        )
        .await
        .unwrap();

    let records = vec![
        record("Sol", Some(10)),
        record("Achenar", Some(11)),
        record("Lave", Some(12)),
        record("Eol Prou RS-T d3-94", Some(30)),
    ];
    let result = synchronizer("", "")
        .sync_dump(db, records, false, at(1), None)
        .await;
    match result {
        Err(EngineError::Database(_)) => {}
        Err(other) => panic!("expected the commit failure, got {other}"),
        Ok(_) => panic!("run should fail when a batch cannot commit"),
    }

    let reopened = CatalogDb::open_local(path).await.unwrap();
    assert!(reopened.get_system(12).await.unwrap().is_none());
    let active = reopened.active_rows(Source::MainDump).await.unwrap();
    assert!(active.len() <= 2, "only whole batches before the failure survive");
    assert!(active.iter().all(|row| row.id != 12));
}

#[tokio::test]
async fn fresh_catalog_is_built_and_claimed_by_main_dump() {
    let sync = synchronizer("", "");
    let outcome = sync
        .sync_dump(empty_catalog().await, vec![record("Sol", Some(10))], false, at(1), None)
        .await
        .unwrap();

    assert_eq!(outcome.report.mode, Some(RunMode::FullBuild));
    assert_eq!(outcome.report.admitted, 1);
    assert_eq!(outcome.report.resolved, 1);
    assert_eq!(outcome.report.inserted_or_updated, 1);

    let sol = outcome.db.get_system(10).await.unwrap().unwrap();
    assert_eq!(sol.name, "Sol");
    assert_eq!(sol.claims.bits(), 1);
    assert_eq!(sol.deleted_at, None);
}

#[tokio::test]
async fn system_gone_from_dump_is_soft_deleted_at_run_time() {
    let sync = synchronizer("", "");
    let first = sync
        .sync_dump(
            empty_catalog().await,
            vec![record("Sol", Some(10)), record("Achenar", Some(11))],
            false,
            at(1),
            None,
        )
        .await
        .unwrap();

    let second = sync
        .sync_dump(first.db, vec![record("Achenar", Some(11))], false, at(2), None)
        .await
        .unwrap();
    assert_eq!(second.report.mode, Some(RunMode::Incremental));
    assert_eq!(second.report.unchanged, 1);
    assert_eq!(second.report.retired, 1);
    assert_eq!(second.report.soft_deleted, 1);

    let sol = second.db.get_system(10).await.unwrap().unwrap();
    assert_eq!(sol.claims.bits(), 0);
    assert_eq!(sol.deleted_at, Some(at(2)));

    let achenar = second.db.get_system(11).await.unwrap().unwrap();
    assert_eq!(achenar.updated_at, at(1), "unchanged rows are not rewritten");
}

#[tokio::test]
async fn beacon_claim_keeps_row_active_when_dump_drops_it() {
    let sync = synchronizer("", "");
    let built = sync
        .sync_dump(empty_catalog().await, vec![record("Sol", Some(10))], false, at(1), None)
        .await
        .unwrap();
    let beacons = sync
        .sync_beacons(built.db, vec!["Sol".into()], at(1), None)
        .await
        .unwrap();
    assert_eq!(beacons.db.get_system(10).await.unwrap().unwrap().claims.bits(), 3);

    let outcome = sync
        .sync_dump(beacons.db, vec![record("Lave", Some(12))], false, at(2), None)
        .await
        .unwrap();
    assert_eq!(outcome.report.retired, 1);
    assert_eq!(outcome.report.soft_deleted, 0);

    let sol = outcome.db.get_system(10).await.unwrap().unwrap();
    assert_eq!(sol.claims.bits(), 2);
    assert_eq!(sol.deleted_at, None);
}

#[tokio::test]
async fn excluded_prefix_never_reaches_the_catalog() {
    let sync = synchronizer("Wregoe\n", "");
    let outcome = sync
        .sync_dump(
            empty_catalog().await,
            vec![record("Sol", Some(10)), record("Wregoe AB-C d1-2", Some(40))],
            false,
            at(1),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.excluded_by_pattern, 1);
    assert_eq!(outcome.report.admitted, 1);
    assert!(outcome.db.get_system(40).await.unwrap().is_none());
}

#[tokio::test]
async fn ambiguous_name_is_parked_for_review() {
    let sync = synchronizer("", "");
    let outcome = sync
        .sync_dump(
            empty_catalog().await,
            vec![record("Sol", Some(10)), record("Hyades Sector X", None)],
            false,
            at(1),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.ambiguous, 1);
    assert_eq!(outcome.report.admitted, 1);
    assert!(outcome.db.get_system(20).await.unwrap().is_none());
    assert!(outcome.db.get_system(21).await.unwrap().is_none());

    let parked = outcome.db.list_ambiguous().await.unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].candidate_ids, vec![20, 21]);
}

#[tokio::test]
async fn returning_system_is_reactivated() {
    let sync = synchronizer("", "");
    let built = sync
        .sync_dump(
            empty_catalog().await,
            vec![record("Sol", Some(10)), record("Lave", Some(12))],
            false,
            at(1),
            None,
        )
        .await
        .unwrap();
    let dropped = sync
        .sync_dump(built.db, vec![record("Lave", Some(12))], false, at(2), None)
        .await
        .unwrap();
    let back = sync
        .sync_dump(
            dropped.db,
            vec![record("Sol", Some(10)), record("Lave", Some(12))],
            false,
            at(3),
            None,
        )
        .await
        .unwrap();

    let sol = back.db.get_system(10).await.unwrap().unwrap();
    assert_eq!(sol.claims.bits(), 1);
    assert_eq!(sol.deleted_at, None);
    assert_eq!(sol.created_at, at(1));
    assert_eq!(sol.updated_at, at(3));
    assert!(back.db.verify().await.unwrap().is_clean());
}

#[tokio::test]
async fn entry_without_id_survives_by_name() {
    let sync = synchronizer("", "");
    let built = sync
        .sync_dump(empty_catalog().await, vec![record("Lave", Some(12))], false, at(1), None)
        .await
        .unwrap();

    let again = sync
        .sync_dump(built.db, vec![record("lave", None)], false, at(2), None)
        .await
        .unwrap();
    assert_eq!(again.report.unchanged, 1);
    assert_eq!(again.report.retired, 0);
    assert_eq!(again.report.inserted_or_updated, 0);
}

#[tokio::test]
async fn forced_full_build_discards_previous_rows() {
    let sync = synchronizer("", "");
    let built = sync
        .sync_dump(
            empty_catalog().await,
            vec![record("Sol", Some(10)), record("Lave", Some(12))],
            false,
            at(1),
            None,
        )
        .await
        .unwrap();

    let rebuilt = sync
        .sync_dump(built.db, vec![record("Lave", Some(12))], true, at(2), None)
        .await
        .unwrap();
    assert_eq!(rebuilt.report.mode, Some(RunMode::FullBuild));
    assert!(rebuilt.db.get_system(10).await.unwrap().is_none());
    assert_eq!(rebuilt.db.get_system(12).await.unwrap().unwrap().created_at, at(2));
}

#[tokio::test]
async fn unresolvable_entries_are_dropped_and_counted() {
    let sync = synchronizer("", "");
    let outcome = sync
        .sync_dump(
            empty_catalog().await,
            vec![
                record("Sol", Some(10)),
                DumpRecord {
                    name: "Nowhere".into(),
                    id: Some(99),
                    estimated: Some(EstimatedPosition {
                        x: 1.0,
                        y: 1.0,
                        z: 1.0,
                        precision: 10.0,
                    }),
                },
            ],
            false,
            at(1),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.resolved, 1);
    assert_eq!(outcome.report.unresolved, 1);
    assert!(outcome.db.get_system(99).await.unwrap().is_none());
}

#[tokio::test]
async fn commit_hook_sees_every_batch() {
    let sync = synchronizer("", "");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook_seen = Arc::clone(&seen);
    let hook: CommitHook = Box::new(move |stats| hook_seen.lock().unwrap().push(stats.batches));

    let outcome = sync
        .sync_dump(
            empty_catalog().await,
            vec![
                record("Sol", Some(10)),
                record("Achenar", Some(11)),
                record("Lave", Some(12)),
            ],
            false,
            at(1),
            Some(hook),
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.batches_committed, 2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

// ---------------------------------------------------------------------------
// Beacons
// ---------------------------------------------------------------------------

#[tokio::test]
async fn beacon_pass_resolves_procedural_and_known_names() {
    let sync = synchronizer("", "");
    let outcome = sync
        .sync_beacons(
            empty_catalog().await,
            vec![
                "Eol Prou RS-T d3-94".into(),
                "Achenar".into(),
                "Hyades Sector X".into(),
                "Unknown Place".into(),
            ],
            at(1),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.admitted, 2);
    assert_eq!(outcome.report.ambiguous, 1);
    assert_eq!(outcome.report.unresolved, 1);
    assert_eq!(outcome.report.inserted_or_updated, 2);
    for id in [30, 11] {
        let row = outcome.db.get_system(id).await.unwrap().unwrap();
        assert_eq!(row.claims.bits(), Source::NavBeacon.bit());
    }
}

#[tokio::test]
async fn empty_beacon_feed_changes_nothing() {
    let sync = synchronizer("", "");
    let seeded = sync
        .sync_beacons(empty_catalog().await, vec!["Achenar".into()], at(1), None)
        .await
        .unwrap();

    let outcome = sync
        .sync_beacons(seeded.db, Vec::new(), at(2), None)
        .await
        .unwrap();
    assert_eq!(outcome.report.retired, 0);
    assert_eq!(outcome.db.get_system(11).await.unwrap().unwrap().claims.bits(), 2);
}

#[tokio::test]
async fn beacon_dropped_from_feed_loses_only_its_claim() {
    let sync = synchronizer("", "");
    let seeded = sync
        .sync_beacons(
            empty_catalog().await,
            vec!["Achenar".into(), "Lave".into()],
            at(1),
            None,
        )
        .await
        .unwrap();

    let outcome = sync
        .sync_beacons(seeded.db, vec!["Lave".into()], at(2), None)
        .await
        .unwrap();
    assert_eq!(outcome.report.unchanged, 1);
    assert_eq!(outcome.report.soft_deleted, 1);
    let achenar = outcome.db.get_system(11).await.unwrap().unwrap();
    assert_eq!(achenar.deleted_at, Some(at(2)));
}
