//! Integration tests for the reconciliation engine.
//!
//! Sessions run against in-memory ledger, cache and fetcher doubles, plus a
//! disk-backed pass over a temporary data directory.

#![allow(clippy::unwrap_used)]

mod support;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use support::fixtures::raw;
use tempfile::TempDir;
use workshop_curator::{
    ArtifactCache, DataLayout, EngineError, LedgerStore, MemoryCache, MemoryLedger, ModRecord,
    ModStatus, Notice, RawItem, ReconciliationEngine, RepairStage, StaticFetcher, TransferError,
};

const COLLECTION: &str = "https://steamcommunity.com/sharedfiles/filedetails/?id=100";

struct Session {
    engine: ReconciliationEngine,
    ledger: MemoryLedger,
    cache: MemoryCache,
    fetcher: StaticFetcher,
}

async fn open(ledger: MemoryLedger, cache: MemoryCache, fetcher: StaticFetcher) -> Session {
    let engine = ReconciliationEngine::open(
        Arc::new(ledger.clone()),
        Arc::new(cache.clone()),
        Arc::new(fetcher.clone()),
    )
    .await;
    Session {
        engine,
        ledger,
        cache,
        fetcher,
    }
}

fn ids(records: &[ModRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Fetcher that knows every id in `ids`, with metadata and an image.
fn full_fetcher(ids: &[&str]) -> StaticFetcher {
    ids.iter().fold(StaticFetcher::new(), |fetcher, id| {
        fetcher
            .with_item(raw(id, &format!("Mod {id}")))
            .with_image(*id, format!("png-{id}").into_bytes())
    })
}

async fn seed_full(cache: &MemoryCache, id: &str) {
    cache
        .write_metadata(&ModRecord::from_raw(raw(id, &format!("Cached {id}"))))
        .await
        .unwrap();
    cache.write_image(id, b"cached").await.unwrap();
}

fn assert_pools_consistent(engine: &ReconciliationEngine) {
    let selection = engine.selection();
    let candidates: Vec<&str> = ids(selection.candidates());
    let held: Vec<&str> = ids(selection.held());
    let candidate_set: HashSet<&str> = candidates.iter().copied().collect();
    let held_set: HashSet<&str> = held.iter().copied().collect();

    assert_eq!(candidate_set.len(), candidates.len(), "duplicate candidate");
    assert_eq!(held_set.len(), held.len(), "duplicate held record");
    assert!(
        candidate_set.is_disjoint(&held_set),
        "pools overlap: {candidates:?} / {held:?}"
    );
    assert!(!candidates.contains(&"") && !held.contains(&""));
}

// ==================== Classification scenarios ====================

#[tokio::test]
async fn test_fresh_items_land_in_candidates_as_new() {
    let fetcher = StaticFetcher::new()
        .with_collection(COLLECTION, vec![raw("1", "One"), raw("2", "Two")]);
    let mut s = open(MemoryLedger::new(), MemoryCache::new(), fetcher).await;

    let report = s.engine.scrape(COLLECTION).await;

    assert_eq!(report.new, 2);
    assert!(report.notices.is_empty());
    assert_eq!(ids(s.engine.selection().candidates()), vec!["1", "2"]);
    assert!(s.engine.selection().held().is_empty());
    assert!(
        s.engine
            .selection()
            .candidates()
            .iter()
            .all(|r| r.status == ModStatus::New)
    );
}

#[tokio::test]
async fn test_ledger_item_moves_into_held_as_committed() {
    let fetcher = StaticFetcher::new().with_collection(COLLECTION, vec![raw("5", "Five")]);
    let mut s = open(MemoryLedger::with_ids(["5"]), MemoryCache::new(), fetcher).await;

    let report = s.engine.scrape(COLLECTION).await;

    assert_eq!(report.committed, 1);
    assert!(s.engine.selection().candidates().is_empty());
    let held = s.engine.selection().held_record("5").unwrap();
    assert_eq!(held.status, ModStatus::Committed);
    assert_eq!(held.title, "Five");
}

#[tokio::test]
async fn test_held_item_missing_from_ledger_becomes_conflict() {
    let fetcher = StaticFetcher::new().with_collection(COLLECTION, vec![raw("7", "Seven")]);
    let mut s = open(MemoryLedger::new(), MemoryCache::new(), fetcher).await;
    s.engine.scrape(COLLECTION).await;
    s.engine.promote("7").unwrap();

    let report = s.engine.scrape(COLLECTION).await;

    assert_eq!(report.conflicts, 1);
    assert_eq!(
        report.notices,
        vec![Notice::ConflictsDetected {
            ids: vec!["7".to_string()]
        }]
    );
    assert_eq!(ids(s.engine.selection().held()), vec!["7"]);
    assert_eq!(
        s.engine.selection().held_record("7").unwrap().status,
        ModStatus::Conflict
    );
    assert!(s.engine.selection().candidates().is_empty());
}

#[tokio::test]
async fn test_commit_merges_evicts_orphan_and_repairs_missing_metadata() {
    let cache = MemoryCache::new();
    seed_full(&cache, "3").await;
    seed_full(&cache, "9").await;
    cache.write_image("4", b"cached").await.unwrap();
    let fetcher = full_fetcher(&["3", "4"]);
    let mut s = open(MemoryLedger::with_ids(["3"]), cache, fetcher).await;
    s.engine.classify(vec![raw("3", "Three"), raw("4", "Four")]);
    s.engine.promote("4").unwrap();
    assert_eq!(ids(s.engine.selection().held()), vec!["3", "4"]);

    let report = s.engine.commit().await.unwrap();

    assert_eq!(report.added, vec!["4"]);
    assert_eq!(s.ledger.snapshot(), set(&["3", "4"]));
    assert_eq!(report.repair.evicted_metadata, vec!["9"]);
    assert_eq!(report.repair.evicted_images, vec!["9"]);
    assert_eq!(report.repair.missing_metadata, vec!["4"]);
    assert!(report.repair.missing_images.is_empty());
    assert_eq!(report.repair.metadata_written, vec!["4"]);
    assert_eq!(s.fetcher.requested_ids(), vec![vec!["4".to_string()]]);

    assert!(!s.cache.has_metadata("9").await.unwrap());
    assert!(!s.cache.has_image("9").await.unwrap());
    assert_eq!(s.cache.read_metadata("4").await.unwrap().title, "Mod 4");
    assert_eq!(s.cache.read_metadata("3").await.unwrap().title, "Cached 3");
    assert_eq!(s.cache.image("3").unwrap(), b"cached");
}

// ==================== Properties ====================

#[tokio::test]
async fn test_classification_is_idempotent() {
    let items = vec![raw("1", "One"), raw("2", "Two"), raw("5", "Five"), raw("1", "Dup")];
    let mut s = open(MemoryLedger::with_ids(["5"]), MemoryCache::new(), StaticFetcher::new()).await;
    s.engine.classify(items.clone());
    s.engine.promote("2").unwrap();
    s.engine.classify(items.clone());
    let first = s.engine.selection().clone();

    let report = s.engine.classify(items);

    assert_eq!(s.engine.selection(), &first);
    assert_eq!(report.conflicts, 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_pools_stay_disjoint_across_operations() {
    let mut s = open(
        MemoryLedger::with_ids(["3"]),
        MemoryCache::new(),
        full_fetcher(&["1", "2", "3", "4"]),
    )
    .await;
    let batch_a = vec![raw("1", "1"), raw("2", "2"), raw("3", "3"), raw("", "blank")];
    let batch_b = vec![raw("2", "2"), raw("4", "4"), raw("4", "4 again")];

    s.engine.classify(batch_a.clone());
    assert_pools_consistent(&s.engine);
    s.engine.promote("1").unwrap();
    assert_pools_consistent(&s.engine);
    s.engine.classify(batch_b.clone());
    assert_pools_consistent(&s.engine);
    s.engine.promote_all();
    assert_pools_consistent(&s.engine);
    s.engine.demote("2").unwrap();
    assert_pools_consistent(&s.engine);
    s.engine.classify(batch_a);
    assert_pools_consistent(&s.engine);
    s.engine.demote_all();
    assert_pools_consistent(&s.engine);
    s.engine.promote_all();
    s.engine.commit().await.unwrap();
    assert_pools_consistent(&s.engine);
    s.engine.classify(batch_b);
    assert_pools_consistent(&s.engine);
}

#[tokio::test]
async fn test_ledger_never_shrinks_across_commits() {
    let mut s = open(
        MemoryLedger::with_ids(["1"]),
        MemoryCache::new(),
        full_fetcher(&["1", "2", "3"]),
    )
    .await;
    let mut previous = s.engine.ledger().clone();

    for batch in [vec!["2"], vec![], vec!["3"], vec!["2", "3"]] {
        s.engine
            .classify(batch.iter().map(|id| raw(id, id)).collect());
        s.engine.promote_all();
        s.engine.commit().await.unwrap();

        let current = s.ledger.snapshot();
        assert!(current.is_superset(&previous), "{current:?} lost ids from {previous:?}");
        assert_eq!(&current, s.engine.ledger());
        previous = current;
    }
    assert_eq!(previous, set(&["1", "2", "3"]));
}

#[tokio::test]
async fn test_cache_converges_to_ledger_with_available_fetcher() {
    let cache = MemoryCache::new();
    seed_full(&cache, "8").await;
    cache.write_image("1", b"only image").await.unwrap();
    let mut s = open(
        MemoryLedger::with_ids(["1", "2"]),
        cache,
        full_fetcher(&["1", "2", "3"]),
    )
    .await;
    s.engine.classify(vec![raw("3", "Three")]);
    s.engine.promote("3").unwrap();

    let report = s.engine.commit().await.unwrap();

    assert!(report.repair.is_clean(), "{:?}", report.repair.failures);
    let ledger = s.engine.ledger().clone();
    assert_eq!(s.cache.list_metadata_ids().await.unwrap(), ledger);
    assert_eq!(s.cache.list_image_ids().await.unwrap(), ledger);
    assert_eq!(s.cache.list_cached_ids().await.unwrap(), ledger);

    let again = s.engine.commit().await.unwrap();
    assert!(again.repair.requested.is_empty());
}

#[tokio::test]
async fn test_committed_record_cannot_be_demoted() {
    let mut s = open(MemoryLedger::with_ids(["5"]), MemoryCache::new(), StaticFetcher::new()).await;
    s.engine.classify(vec![raw("5", "Five")]);
    let before = s.engine.selection().clone();

    let err = s.engine.demote("5").unwrap_err();

    assert_eq!(err, TransferError::AlreadyCommitted { id: "5".into() });
    assert_eq!(s.engine.selection(), &before);
}

#[tokio::test]
async fn test_demoted_conflict_returns_as_new() {
    let mut s = open(MemoryLedger::new(), MemoryCache::new(), StaticFetcher::new()).await;
    s.engine.classify(vec![raw("7", "Seven")]);
    s.engine.promote("7").unwrap();
    s.engine.classify(vec![raw("7", "Seven")]);

    s.engine.demote("7").unwrap();

    let candidate = s.engine.selection().candidate("7").unwrap();
    assert_eq!(candidate.status, ModStatus::New);
}

#[tokio::test]
async fn test_rejected_transfers_leave_state_unchanged() {
    let mut s = open(MemoryLedger::new(), MemoryCache::new(), StaticFetcher::new()).await;
    s.engine.classify(vec![raw("1", "One")]);
    let before = s.engine.selection().clone();

    assert_eq!(
        s.engine.promote("404").unwrap_err(),
        TransferError::NotInCandidates { id: "404".into() }
    );
    assert_eq!(
        s.engine.demote("1").unwrap_err(),
        TransferError::NotHeld { id: "1".into() }
    );
    assert_eq!(s.engine.selection(), &before);
}

// ==================== Failure handling ====================

#[tokio::test]
async fn test_ledger_save_failure_aborts_commit_before_repair() {
    let cache = MemoryCache::new();
    seed_full(&cache, "9").await;
    let ledger = MemoryLedger::with_ids(["1"]).failing_saves();
    let mut s = open(ledger, cache, full_fetcher(&["2"])).await;
    s.engine.classify(vec![raw("2", "Two")]);
    s.engine.promote("2").unwrap();

    let err = s.engine.commit().await.unwrap_err();

    assert!(matches!(err, EngineError::LedgerSave { .. }));
    assert_eq!(s.engine.ledger(), &set(&["1"]));
    assert!(s.cache.has_metadata("9").await.unwrap(), "no eviction after failed save");
    assert!(s.fetcher.requested_ids().is_empty());
}

#[tokio::test]
async fn test_repair_is_best_effort_per_id() {
    let cache = MemoryCache::new();
    cache.fail_image_writes_for("2");
    let fetcher = full_fetcher(&["1", "2"]).with_unavailable("3");
    let mut s = open(MemoryLedger::with_ids(["1", "2", "3"]), cache, fetcher).await;

    let report = s.engine.commit().await.unwrap();

    assert!(report.added.is_empty());
    assert_eq!(report.repair.requested, vec!["1", "2", "3"]);
    assert_eq!(report.repair.metadata_written, vec!["1", "2"]);
    assert_eq!(report.repair.images_written, vec!["1"]);
    let failed: Vec<_> = report
        .repair
        .failures
        .iter()
        .map(|f| (f.id.as_str(), f.stage))
        .collect();
    assert_eq!(
        failed,
        vec![("2", RepairStage::WriteImage), ("3", RepairStage::Fetch)]
    );
}

#[tokio::test]
async fn test_demote_all_notice_counts_committed() {
    let mut s = open(MemoryLedger::with_ids(["1", "2"]), MemoryCache::new(), StaticFetcher::new()).await;
    s.engine
        .classify(vec![raw("1", "1"), raw("2", "2"), raw("3", "3")]);
    s.engine.promote("3").unwrap();

    let (outcome, notice) = s.engine.demote_all();

    assert_eq!((outcome.moved, outcome.skipped), (1, 2));
    assert_eq!(notice, Some(Notice::CommittedSkipped { count: 2 }));
    assert_eq!(ids(s.engine.selection().held()), vec!["1", "2"]);
}

// ==================== Disk-backed session ====================

#[tokio::test]
async fn test_disk_session_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DataLayout::new(temp_dir.path());
    let fetcher = full_fetcher(&["10", "11"])
        .with_collection(COLLECTION, vec![raw("10", "Ten"), raw("11", "Eleven")]);

    let mut engine = ReconciliationEngine::open(
        Arc::new(layout.ledger()),
        Arc::new(layout.cache()),
        Arc::new(fetcher.clone()),
    )
    .await;
    engine.scrape(COLLECTION).await;
    engine.promote("11").unwrap();
    let report = engine.commit().await.unwrap();
    assert!(report.repair.is_clean());

    let ledger_text = std::fs::read_to_string(layout.ledger_path()).unwrap();
    assert_eq!(ledger_text.trim_end(), "WorkshopItems=11");
    assert!(layout.objects_dir().join("11.json").exists());
    assert!(layout.objects_dir().join("tempimage").join("11.png").exists());

    let mut reopened = ReconciliationEngine::open(
        Arc::new(layout.ledger()),
        Arc::new(layout.cache()),
        Arc::new(fetcher),
    )
    .await;
    assert_eq!(reopened.ledger(), &set(&["11"]));
    reopened.scrape(COLLECTION).await;
    assert_eq!(ids(reopened.selection().candidates()), vec!["10"]);
    assert_eq!(ids(reopened.selection().held()), vec!["11"]);

    let library = reopened.library().await;
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].record.as_ref().unwrap().title, "Mod 11");
    assert!(library[0].has_image);
}

#[tokio::test]
async fn test_corrupt_ledger_opens_empty_and_is_replaced_on_commit() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DataLayout::new(temp_dir.path());
    std::fs::write(layout.ledger_path(), "this is not a ledger\n").unwrap();
    assert!(layout.ledger().load().await.is_err());

    let mut engine = ReconciliationEngine::open(
        Arc::new(layout.ledger()),
        Arc::new(layout.cache()),
        Arc::new(full_fetcher(&["20"])),
    )
    .await;
    assert!(engine.ledger().is_empty());

    engine.classify(vec![RawItem::placeholder("20")]);
    engine.promote("20").unwrap();
    engine.commit().await.unwrap();

    assert_eq!(layout.ledger().load().await.unwrap(), set(&["20"]));
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("WorkshopID.txt.corrupt")).unwrap(),
        "this is not a ledger\n"
    );
}

#[tokio::test]
async fn test_ledger_with_byte_order_mark_survives_import() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DataLayout::new(temp_dir.path());
    std::fs::write(layout.ledger_path(), "\u{feff}WorkshopItems=1;2;3\r\n").unwrap();

    let mut engine = ReconciliationEngine::open(
        Arc::new(layout.ledger()),
        Arc::new(layout.cache()),
        Arc::new(full_fetcher(&["1", "2", "3", "4"])),
    )
    .await;
    assert_eq!(engine.ledger(), &set(&["1", "2", "3"]));

    let report = engine.import_ids(["4".to_string()]).await.unwrap();

    assert_eq!(report.added, vec!["4"]);
    assert_eq!(
        std::fs::read_to_string(layout.ledger_path()).unwrap(),
        "WorkshopItems=1;2;3;4"
    );
}
