use std::rc::Rc;

use serde_json::json;

use tsunagari::{FixedIdentity, LocalStore, MemoryDocumentStore, MemoryLocalStore, RunStore};
use tsunagari_core::run::RunState;
use tsunagari_core::snapshot::{local_run_key, remote_payload, RunSnapshot};

fn in_progress_snapshot() -> RunSnapshot {
    let mut run = RunState::new("Demo", "jane");
    run.moves = 2;
    run.found_ids = vec![vec!["A1".to_string(), "A2".to_string()]];
    run.selected_ids = vec!["B1".to_string()];
    run.seed = Some(77);
    RunSnapshot::new(run, 1_000)
}

fn anonymous_store(
    docs: &Rc<MemoryDocumentStore>,
    local: &Rc<MemoryLocalStore>,
) -> RunStore<Rc<MemoryDocumentStore>, Rc<MemoryLocalStore>, FixedIdentity> {
    RunStore::new(docs.clone(), local.clone(), FixedIdentity::anonymous())
}

fn signed_in_store(
    docs: &Rc<MemoryDocumentStore>,
    local: &Rc<MemoryLocalStore>,
    uid: &str,
) -> RunStore<Rc<MemoryDocumentStore>, Rc<MemoryLocalStore>, FixedIdentity> {
    RunStore::new(docs.clone(), local.clone(), FixedIdentity::signed_in(uid))
}

#[tokio::test]
async fn anonymous_save_round_trips_through_local_only() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = anonymous_store(&docs, &local);

    let snapshot = in_progress_snapshot();
    store.save("p1", &snapshot).await;

    assert!(docs.document("users/u1/runs/p1").is_none());
    assert!(local.get(&local_run_key("p1")).is_some());
    assert_eq!(store.load("p1").await, Some(snapshot));
}

#[tokio::test]
async fn remote_load_failure_falls_back_to_local() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = signed_in_store(&docs, &local, "u1");

    let snapshot = in_progress_snapshot();
    store.save("p1", &snapshot).await;

    docs.set_failing(true);
    assert_eq!(store.load("p1").await, Some(snapshot));
}

#[tokio::test]
async fn remote_save_failure_is_contained() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = signed_in_store(&docs, &local, "u1");

    docs.set_failing(true);
    let snapshot = in_progress_snapshot();
    store.save("p1", &snapshot).await;

    assert!(docs.document("users/u1/runs/p1").is_none());
    docs.set_failing(false);
    assert_eq!(store.load("p1").await, Some(snapshot));
}

#[tokio::test]
async fn clear_then_load_yields_a_fresh_snapshot() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = anonymous_store(&docs, &local);

    store.save("p1", &in_progress_snapshot()).await;
    store.clear("p1").await;

    let loaded = store.load("p1").await.expect("cleared snapshot");
    assert!(!loaded.run.completed);
    assert_eq!(loaded.run.moves, 0);
    assert!(loaded.run.found_ids.is_empty());
    assert!(loaded.ts > 1_000);
}

#[tokio::test]
async fn cloud_wins_on_load_and_mirrors_locally() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());

    let mut stale = RunState::new("Demo", "jane");
    stale.moves = 1;
    anonymous_store(&docs, &local)
        .save("p1", &RunSnapshot::new(stale, 500))
        .await;

    let cloud = in_progress_snapshot();
    docs.insert("users/u1/runs/p1", remote_payload(&cloud, 2_000));

    let store = signed_in_store(&docs, &local, "u1");
    assert_eq!(store.load("p1").await, Some(cloud.clone()));

    // The local mirror was refreshed from the cloud copy.
    let raw = local.get(&local_run_key("p1")).expect("mirror");
    let mirrored: serde_json::Value = serde_json::from_str(&raw).expect("parse mirror");
    assert_eq!(mirrored["run"]["moves"], 2);
    assert_eq!(mirrored["ts"], 1_000);
}

#[tokio::test]
async fn remote_documents_carry_packed_found_ids() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = signed_in_store(&docs, &local, "u1");

    store.save("p1", &in_progress_snapshot()).await;

    let doc = docs.document("users/u1/runs/p1").expect("remote doc");
    assert_eq!(doc["run"]["foundIds"][0]["items"][1], "A2");
    assert_eq!(doc["title"], "Demo");
    assert!(doc["updatedAt"].is_i64());
}

#[tokio::test]
async fn legacy_unpacked_remote_documents_still_load() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    docs.insert(
        "users/u1/runs/p1",
        json!({
            "ts": 900,
            "run": {
                "title": "Old",
                "moves": 4,
                "foundIds": [["A1", "A2"], ["B1", "B2"]],
            },
        }),
    );

    let store = signed_in_store(&docs, &local, "u1");
    let loaded = store.load("p1").await.expect("legacy doc");
    assert_eq!(loaded.run.moves, 4);
    assert_eq!(
        loaded.run.found_ids,
        vec![
            vec!["A1".to_string(), "A2".to_string()],
            vec!["B1".to_string(), "B2".to_string()],
        ]
    );
}

#[tokio::test]
async fn cleared_remote_records_are_not_resumed() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = signed_in_store(&docs, &local, "u1");

    store.save("p1", &in_progress_snapshot()).await;
    store.clear("p1").await;

    let doc = docs.document("users/u1/runs/p1").expect("remote doc");
    assert_eq!(doc["deleted"], true);
    // Soft delete keeps the run fields for history.
    assert_eq!(doc["run"]["moves"], 2);

    let loaded = store.load("p1").await.expect("local fallback");
    assert_eq!(loaded.run.moves, 0);
    assert!(!loaded.run.completed);
}

#[tokio::test]
async fn saving_after_clear_revives_the_remote_record() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = signed_in_store(&docs, &local, "u1");

    store.save("p1", &in_progress_snapshot()).await;
    store.clear("p1").await;

    let mut fresh = RunState::new("Demo", "jane");
    fresh.moves = 1;
    let restart = RunSnapshot::new(fresh, 3_000);
    store.save("p1", &restart).await;

    let doc = docs.document("users/u1/runs/p1").expect("remote doc");
    assert_eq!(doc["deleted"], false);
    assert_eq!(store.load("p1").await, Some(restart));
}

#[tokio::test]
async fn saves_update_last_active_puzzle_metadata() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    let store = signed_in_store(&docs, &local, "u1");

    store.save("p1", &in_progress_snapshot()).await;
    store.save("p2", &in_progress_snapshot()).await;

    let meta = docs.document("users/u1").expect("user doc");
    assert_eq!(meta["lastActive"], "p2");
    assert!(meta["lastActiveUpdatedAt"].is_i64());
}

#[tokio::test]
async fn broken_local_storage_never_surfaces() {
    let docs = Rc::new(MemoryDocumentStore::new());
    let local = Rc::new(MemoryLocalStore::new());
    local.set_failing(true);
    let store = anonymous_store(&docs, &local);

    store.save("p1", &in_progress_snapshot()).await;
    assert_eq!(store.load("p1").await, None);
}
