//! View model tests against a real actor and a shaped in-memory store, with
//! no bridge in the way, so store call counts pin down exactly which
//! operations each path reached.

use fruit_app::error::FruitError;
use fruit_app::model::Fruit;
use fruit_app::view_model::{self, ViewModelHandle};
use record_client::memory::{MemoryStore, StoreOp};
use record_client::{AccountStatus, DatabaseScope, PermissionState, StoreClient, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// Polls until `cond` holds, failing the test after two seconds.
async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn spawn_view_model(store: &Arc<MemoryStore>) -> ViewModelHandle {
    let client = StoreClient::new(store.clone(), DatabaseScope::Private);
    let (actor, handle) = view_model::new(client);
    tokio::spawn(actor.run());
    handle
}

async fn seed(store: &Arc<MemoryStore>, names: &[&str]) {
    let client = StoreClient::new(store.clone(), DatabaseScope::Private);
    for name in names {
        client.create(&Fruit::with_name(*name)).await.unwrap();
    }
}

#[tokio::test]
async fn startup_short_circuits_without_an_account() {
    let store = Arc::new(MemoryStore::new().with_account_status(AccountStatus::NoAccount));
    seed(&store, &["Apple", "Banana"]).await;

    let handle = spawn_view_model(&store);
    {
        let handle = handle.clone();
        wait_until("status text", move || {
            handle.state().status_text == "no account"
        })
        .await;
    }

    // The handshake stopped at the status check: no permission prompt, no
    // retrieval, even though the store has rows.
    let state = handle.state();
    assert!(state.fruits.is_empty());
    assert!(!state.have_permission);
    assert_eq!(store.calls(StoreOp::RequestPermission), 0);
    assert_eq!(store.calls(StoreOp::Query), 0);
}

#[tokio::test]
async fn startup_short_circuits_when_permission_is_denied() {
    let store = Arc::new(MemoryStore::new().with_permission(PermissionState::Denied));
    seed(&store, &["Apple"]).await;

    let handle = spawn_view_model(&store);
    {
        let store = store.clone();
        wait_until("permission prompt", move || {
            store.calls(StoreOp::RequestPermission) == 1
        })
        .await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    let state = handle.state();
    assert_eq!(state.status_text, "available");
    assert!(!state.have_permission);
    assert!(state.fruits.is_empty());
    assert_eq!(store.calls(StoreOp::UserIdentity), 0);
    assert_eq!(store.calls(StoreOp::Query), 0);
}

#[tokio::test]
async fn missing_identity_is_non_fatal() {
    // No identity configured: the lookup reports NotFound.
    let store = Arc::new(MemoryStore::new());
    seed(&store, &["Apple"]).await;

    let handle = spawn_view_model(&store);
    {
        let handle = handle.clone();
        wait_until("initial retrieval", move || handle.state().fruits.len() == 1).await;
    }

    let state = handle.state();
    assert_eq!(state.user_identity, "");
    assert_eq!(state.fruit_names(), ["Apple"]);
}

#[tokio::test]
async fn subscription_failure_is_non_fatal() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, &["Apple"]).await;
    store.inject_failure(StoreOp::Subscribe, StoreError::Transport("rejected".into()));

    let handle = spawn_view_model(&store);
    {
        let handle = handle.clone();
        wait_until("initial retrieval", move || handle.state().fruits.len() == 1).await;
    }
}

#[tokio::test]
async fn failed_add_rolls_back_the_optimistic_insert() {
    let store = Arc::new(MemoryStore::new());
    let handle = spawn_view_model(&store);

    store.inject_failure(StoreOp::Save, StoreError::Transport("offline".into()));

    let result = handle.add_fruit("Apple").await;
    assert!(matches!(
        result,
        Err(FruitError::Store(StoreError::Transport(_)))
    ));

    let state = handle.state();
    assert!(state.fruits.is_empty(), "optimistic insert must roll back");
    assert!(state.message.contains("failed to add Apple"));
}

#[tokio::test]
async fn updating_a_fruit_missing_locally_is_a_state_fault() {
    let store = Arc::new(MemoryStore::new());
    let handle = spawn_view_model(&store);

    // Never added through the view model, so no local entry exists.
    let ghost = Fruit::with_name("Ghost");
    let result = handle.update_fruit(ghost).await;

    assert!(matches!(result, Err(FruitError::NotFound(_))));
    assert!(handle.state().fruits.is_empty());
}

#[tokio::test]
async fn delete_stops_at_the_first_transport_failure() {
    let store = Arc::new(MemoryStore::new());
    let handle = spawn_view_model(&store);

    handle.add_fruit("Apple").await.unwrap();
    handle.add_fruit("Banana").await.unwrap();

    // Deletes retry transport failures, so fail every attempt.
    for _ in 0..3 {
        store.inject_failure(StoreOp::Delete, StoreError::Transport("offline".into()));
    }

    let result = handle.delete_fruits(vec![0, 1]).await;
    assert!(matches!(
        result,
        Err(FruitError::Store(StoreError::Transport(_)))
    ));

    // Nothing was removed locally: the first remote delete never succeeded
    // and the second was never attempted.
    assert_eq!(handle.state().fruit_names(), ["Apple", "Banana"]);
}

#[tokio::test]
async fn out_of_range_offsets_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let handle = spawn_view_model(&store);

    handle.add_fruit("Apple").await.unwrap();
    handle.delete_fruits(vec![7]).await.unwrap();

    assert_eq!(handle.state().fruit_names(), ["Apple"]);
}
