//! Retry reconciler against scripted pages and model answers.

use std::sync::Arc;

use serde_json::json;

use persona_common::{ActorEntry, EntryStatus, Info};
use persona_scout::composer::Composer;
use persona_scout::reconciler::Reconciler;
use persona_scout::stats::PassStats;
use persona_scout::store::{CollectionStore, JsonFileStore, Loaded};
use persona_scout::testing::{
    entry, failed_entry, incomplete_entry, ok_entry, task, MockFetcher, MockGateway,
    RecordingStore,
};

const RETRY_MODEL: &str = "retry-model";

fn build(fetcher: MockFetcher, gateway: MockGateway) -> (Composer, Arc<MockFetcher>, Arc<MockGateway>) {
    let fetcher = Arc::new(fetcher);
    let gateway = Arc::new(gateway);
    let composer = Composer::new(fetcher.clone(), gateway.clone(), "namu");
    (composer, fetcher, gateway)
}

/// A page whose text and markup both carry `marker`, so gateway rules can
/// target it.
fn page(fetcher: MockFetcher, url: &str, marker: &str) -> MockFetcher {
    fetcher.on_page(
        url,
        &format!("{marker}: actor biography and filmography"),
        &format!("<html><body>{marker}<img src=\"https://i.namu.wiki/i/x.webp\"></body></html>"),
    )
}

#[tokio::test]
async fn failed_entry_is_recovered_in_place() {
    let store = RecordingStore::with_entries(vec![
        ok_entry("Lee", "U0"),
        entry(json!({"link": "U1", "status": "failed"})),
    ]);
    let (composer, fetcher, gateway) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("Kim"));

    let report = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap()
        .expect("collection has entries");

    assert_eq!(report.total, 2);
    assert_eq!(
        report.failed,
        PassStats { attempted: 1, recovered: 1, still_defective: 0 }
    );
    assert_eq!(report.incomplete, PassStats::default());

    let entries = store.entries();
    assert_eq!(entries[0], ok_entry("Lee", "U0"));
    let recovered = &entries[1];
    assert_eq!(recovered.status, Some(EntryStatus::Success));
    assert_eq!(recovered.link, "U1");
    assert_eq!(recovered.agency.as_deref(), Some("unknown"));
    assert_eq!(recovered.name(), Info::Known("Kim".into()));
    assert!(recovered.error_message.is_none());
    assert!(recovered.fields.contains_key("emotional_spectrum"));
    assert!(recovered.fields.contains_key("narrative_roles"));

    assert_eq!(fetcher.fetched(), vec!["U1"]);
    assert!(gateway.models_called().iter().all(|m| m == RETRY_MODEL));
}

#[tokio::test]
async fn recovered_entry_keeps_its_agency() {
    let store = RecordingStore::with_entries(vec![failed_entry("U1")]);
    let (composer, _, _) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("Kim"));

    Reconciler::new(&composer, &store, RETRY_MODEL).run().await.unwrap();

    assert_eq!(store.entries()[0].agency.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn entry_still_missing_a_name_is_left_untouched() {
    let original = entry(json!({"name": "no information", "link": "U2", "status": "success"}));
    let store = RecordingStore::with_entries(vec![original.clone()]);
    let (composer, _, _) = build(
        page(MockFetcher::new(), "U2", "page-two"),
        MockGateway::actor("no information"),
    );

    let report = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        report.incomplete,
        PassStats { attempted: 1, recovered: 0, still_defective: 1 }
    );
    assert_eq!(store.entries(), vec![original]);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn incomplete_entry_is_recovered() {
    let store = RecordingStore::with_entries(vec![incomplete_entry("U2")]);
    let (composer, _, _) =
        build(page(MockFetcher::new(), "U2", "page-two"), MockGateway::actor("Park"));

    let report = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.incomplete.recovered, 1);
    let entries = store.entries();
    assert_eq!(entries[0].name(), Info::Known("Park".into()));
    assert_eq!(entries[0].status, Some(EntryStatus::Success));
    assert_eq!(entries[0].agency.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn nothing_to_do_for_missing_corrupt_or_empty_collections() {
    for store in [
        RecordingStore::missing(),
        RecordingStore::corrupt(),
        RecordingStore::with_entries(Vec::new()),
    ] {
        let (composer, fetcher, gateway) = build(MockFetcher::new(), MockGateway::actor("Kim"));

        let report = Reconciler::new(&composer, &store, RETRY_MODEL).run().await.unwrap();

        assert!(report.is_none());
        assert_eq!(fetcher.fetch_count(), 0);
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(store.save_count(), 0);
    }
}

#[tokio::test]
async fn fetch_failure_keeps_entry_failed_with_new_message() {
    let mut stale = failed_entry("U1");
    stale.raw_response = Some("earlier raw answer".into());
    let store = RecordingStore::with_entries(vec![stale]);
    let (composer, _, gateway) =
        build(MockFetcher::new().on_loading("U1"), MockGateway::actor("Kim"));

    let report = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.failed.still_defective, 1);
    assert_eq!(gateway.call_count(), 0);

    let entry = &store.entries()[0];
    assert_eq!(entry.status, Some(EntryStatus::Failed));
    assert_eq!(
        entry.error_message.as_deref(),
        Some("Page still loading after settle budget: U1")
    );
    assert_eq!(entry.raw_response.as_deref(), Some("earlier raw answer"));
    assert_eq!(store.save_count(), 1, "error notes are saved at the end of the run");
}

#[tokio::test]
async fn undecodable_identity_records_raw_response() {
    let store = RecordingStore::with_entries(vec![failed_entry("U1")]);
    let (composer, _, gateway) = build(
        page(MockFetcher::new(), "U1", "page-one"),
        MockGateway::actor("Kim").on(task::IDENTITY, "Sorry, I cannot help with that."),
    );

    Reconciler::new(&composer, &store, RETRY_MODEL).run().await.unwrap();

    assert_eq!(gateway.tasks_called(), vec![task::IDENTITY]);
    let entry = &store.entries()[0];
    assert_eq!(entry.status, Some(EntryStatus::Failed));
    assert!(entry
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("Failed to parse JSON"));
    assert_eq!(
        entry.raw_response.as_deref(),
        Some("Sorry, I cannot help with that.")
    );
}

#[tokio::test]
async fn second_pass_errors_never_downgrade_status() {
    let store = RecordingStore::with_entries(vec![incomplete_entry("U2")]);
    let (composer, _, _) = build(
        page(MockFetcher::new(), "U2", "page-two"),
        MockGateway::actor("Kim").fail_service(task::NARRATIVE, "quota exceeded"),
    );

    let report = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.incomplete.still_defective, 1);
    let entry = &store.entries()[0];
    assert_eq!(entry.status, Some(EntryStatus::Success));
    assert_eq!(entry.name(), Info::NoInformation);
    assert!(entry.error_message.as_deref().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn every_status_is_success_or_failed_after_a_run() {
    let store = RecordingStore::with_entries(vec![
        entry(json!({"name": "Kim", "link": "U1"})),
        entry(json!({"name": "Lee", "link": "U2", "status": "pending"})),
        failed_entry("U3"),
        incomplete_entry("U4"),
        ok_entry("Choi", "U5"),
    ]);
    let fetcher = page(MockFetcher::new(), "U1", "page-one")
        .on_loading("U2")
        .on_loading("U3")
        .on_loading("U4");
    let (composer, _, _) = build(fetcher, MockGateway::new().actor_on("page-one", "Kim"));

    let report = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        report.failed,
        PassStats { attempted: 3, recovered: 1, still_defective: 2 }
    );
    assert_eq!(report.incomplete.attempted, 1);
    for entry in store.entries() {
        assert!(
            matches!(entry.status, Some(EntryStatus::Success | EntryStatus::Failed)),
            "{} ended with status {:?}",
            entry.link,
            entry.status
        );
    }
}

#[tokio::test]
async fn each_recovery_is_checkpointed_before_the_next_attempt() {
    let store = RecordingStore::with_entries(vec![failed_entry("U1"), failed_entry("U2")]);
    let fetcher = page(page(MockFetcher::new(), "U1", "page-one"), "U2", "page-two");
    let gateway = MockGateway::new()
        .actor_on("page-one", "Kim")
        .actor_on("page-two", "Park");
    let (composer, _, _) = build(fetcher, gateway);

    Reconciler::new(&composer, &store, RETRY_MODEL).run().await.unwrap();

    let saves = store.saves();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0][0].name(), Info::Known("Kim".into()));
    assert_eq!(saves[0][1].status, Some(EntryStatus::Failed));
    assert_eq!(saves[1][1].name(), Info::Known("Park".into()));
}

#[tokio::test]
async fn second_run_is_a_fixed_point() {
    let store = RecordingStore::with_entries(vec![failed_entry("U1"), incomplete_entry("U2")]);
    let fetcher = page(page(MockFetcher::new(), "U1", "page-one"), "U2", "page-two");
    let gateway = MockGateway::new()
        .actor_on("page-one", "Kim")
        .actor_on("page-two", "Park");
    let (composer, fetcher, _) = build(fetcher, gateway);
    let reconciler = Reconciler::new(&composer, &store, RETRY_MODEL);

    reconciler.run().await.unwrap();
    let after_first = store.entries();
    let saves_after_first = store.save_count();
    let fetches_after_first = fetcher.fetch_count();

    let report = reconciler.run().await.unwrap().unwrap();

    assert_eq!(report.failed.attempted, 0);
    assert_eq!(report.incomplete.attempted, 0);
    assert_eq!(store.entries(), after_first);
    assert_eq!(store.save_count(), saves_after_first);
    assert_eq!(fetcher.fetch_count(), fetches_after_first);
}

#[tokio::test]
async fn save_failure_aborts_the_run() {
    let store = RecordingStore::with_entries(vec![failed_entry("U1")]).failing_saves();
    let (composer, _, _) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("Kim"));

    let err = Reconciler::new(&composer, &store, RETRY_MODEL)
        .run()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test]
async fn recovered_entries_survive_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("final_actors.json");
    let initial = vec![
        entry(json!({"link": "U1", "status": "failed", "agency": "에이전시"})),
        ok_entry("Lee", "U0"),
    ];
    std::fs::write(&path, serde_json::to_string_pretty(&initial).unwrap()).unwrap();

    let store = JsonFileStore::new(&path);
    let (composer, _, _) =
        build(page(MockFetcher::new(), "U1", "page-one"), MockGateway::actor("김배우"));
    Reconciler::new(&composer, &store, RETRY_MODEL).run().await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("김배우"));
    assert!(raw.contains("에이전시"));

    let reloaded: Vec<ActorEntry> = match store.load().unwrap() {
        Loaded::Entries(entries) => entries,
        other => panic!("expected entries, got {other:?}"),
    };
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[0].status, Some(EntryStatus::Success));
    assert_eq!(reloaded[0].link, "U1");
    assert_eq!(reloaded[1], ok_entry("Lee", "U0"));
}
