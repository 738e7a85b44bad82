//! Batch runner: upsert by link, skip good records, checkpoint every record.

use std::sync::Arc;

use persona_common::{ActorSource, EntryStatus, Info};
use persona_scout::batch::BatchRunner;
use persona_scout::composer::Composer;
use persona_scout::reconciler::Reconciler;
use persona_scout::stats::BatchStats;
use persona_scout::store::{CollectionStore, JsonFileStore, Loaded};
use persona_scout::testing::{
    failed_entry, ok_entry, task, MockFetcher, MockGateway, RecordingStore,
};

const MODEL: &str = "primary-model";

fn source(link: &str, agency: Option<&str>) -> ActorSource {
    ActorSource {
        link: link.to_string(),
        agency: agency.map(str::to_string),
    }
}

fn build(fetcher: MockFetcher, gateway: MockGateway) -> (Composer, Arc<MockFetcher>, Arc<MockGateway>) {
    let fetcher = Arc::new(fetcher);
    let gateway = Arc::new(gateway);
    let composer = Composer::new(fetcher.clone(), gateway.clone(), "namu");
    (composer, fetcher, gateway)
}

fn page(fetcher: MockFetcher, url: &str, marker: &str) -> MockFetcher {
    fetcher.on_page(
        url,
        &format!("{marker}: stage and screen actor"),
        &format!("<html><body>{marker}</body></html>"),
    )
}

#[tokio::test]
async fn new_sources_are_appended_and_checkpointed() {
    let store = RecordingStore::missing();
    let fetcher = page(MockFetcher::new(), "U1", "page-one").on_loading("U2");
    let (composer, _, gateway) = build(fetcher, MockGateway::actor("Kim"));

    let stats = BatchRunner::new(&composer, &store, MODEL)
        .run(&[source("U1", Some("Acme")), source("U2", None)])
        .await
        .unwrap();

    assert_eq!(
        stats,
        BatchStats { processed: 2, succeeded: 1, failed: 1, skipped: 0 }
    );

    let saves = store.saves();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0].len(), 1);

    let entries = store.entries();
    assert_eq!(entries[0].status, Some(EntryStatus::Success));
    assert_eq!(entries[0].agency.as_deref(), Some("Acme"));
    assert_eq!(entries[1].status, Some(EntryStatus::Failed));
    assert_eq!(entries[1].agency.as_deref(), Some("unknown"));
    assert!(entries[1]
        .error_message
        .as_deref()
        .unwrap()
        .contains("still loading"));

    assert!(gateway.models_called().iter().all(|m| m == MODEL));
}

#[tokio::test]
async fn good_records_are_skipped_unless_forced() {
    let store = RecordingStore::with_entries(vec![ok_entry("Lee", "U1")]);
    let (composer, fetcher, _) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("Kim"));

    let stats = BatchRunner::new(&composer, &store, MODEL)
        .run(&[source("U1", None)])
        .await
        .unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(fetcher.fetch_count(), 0);
    assert_eq!(store.save_count(), 0);

    let stats = BatchRunner::new(&composer, &store, MODEL)
        .force(true)
        .run(&[source("U1", Some("Acme"))])
        .await
        .unwrap();
    assert_eq!(stats.processed, 1);

    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name(), Info::Known("Kim".into()));
}

#[tokio::test]
async fn failed_record_is_replaced_in_place() {
    let store = RecordingStore::with_entries(vec![
        failed_entry("U1"),
        ok_entry("Lee", "U2"),
    ]);
    let (composer, _, _) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("Kim"));

    BatchRunner::new(&composer, &store, MODEL)
        .run(&[source("U1", Some("Acme"))])
        .await
        .unwrap();

    let entries = store.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].link, "U1");
    assert_eq!(entries[0].status, Some(EntryStatus::Success));
    assert_eq!(entries[1], ok_entry("Lee", "U2"));
}

#[tokio::test]
async fn undecodable_page_is_recorded_as_failed_with_raw_response() {
    let store = RecordingStore::missing();
    let (composer, _, gateway) = build(
        page(MockFetcher::new(), "U1", "page-one"),
        MockGateway::actor("Kim").on(task::IDENTITY, "not json at all"),
    );

    let stats = BatchRunner::new(&composer, &store, MODEL)
        .run(&[source("U1", None)])
        .await
        .unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(gateway.call_count(), 1);
    let entry = &store.entries()[0];
    assert_eq!(entry.status, Some(EntryStatus::Failed));
    assert_eq!(entry.raw_response.as_deref(), Some("not json at all"));
    assert!(entry.fields.is_empty());
}

#[tokio::test]
async fn corrupt_collection_is_never_overwritten() {
    let store = RecordingStore::corrupt();
    let (composer, fetcher, _) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("Kim"));

    let result = BatchRunner::new(&composer, &store, MODEL)
        .run(&[source("U1", None)])
        .await;

    assert!(result.is_err());
    assert_eq!(fetcher.fetch_count(), 0);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn batch_then_reconcile_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("final_actors.json"));

    // First pass: the second page never finishes loading.
    let fetcher = page(MockFetcher::new(), "U1", "page-one").on_loading("U2");
    let gateway = MockGateway::new().actor_on("page-one", "Kim");
    let (composer, _, _) = build(fetcher, gateway);
    BatchRunner::new(&composer, &store, MODEL)
        .run(&[source("U1", Some("Acme")), source("U2", Some("Acme"))])
        .await
        .unwrap();

    // Retry with both pages available.
    let fetcher = page(page(MockFetcher::new(), "U1", "page-one"), "U2", "page-two");
    let gateway = MockGateway::new()
        .actor_on("page-one", "Kim")
        .actor_on("page-two", "Park");
    let (composer, fetcher, _) = build(fetcher, gateway);
    let report = Reconciler::new(&composer, &store, "retry-model")
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.failed.recovered, 1);
    assert_eq!(fetcher.fetched(), vec!["U2"]);

    let entries = match store.load().unwrap() {
        Loaded::Entries(entries) => entries,
        other => panic!("expected entries, got {other:?}"),
    };
    let names: Vec<Info> = entries.iter().map(|entry| entry.name()).collect();
    assert_eq!(names, vec![Info::Known("Kim".into()), Info::Known("Park".into())]);
    assert!(entries
        .iter()
        .all(|entry| entry.status == Some(EntryStatus::Success)));
}
