//! # Fruit List Demo
//!
//! Walks the whole system once against the in-memory store: the account
//! handshake, optimistic adds, an update, offset-based deletes, and a
//! push-driven re-sync after a change made by "another device".
//!
//! Run with `RUST_LOG=info cargo run` (or `debug` for per-request logs).

use fruit_app::lifecycle::FruitSystem;
use fruit_app::model::Fruit;
use record_client::memory::MemoryStore;
use record_client::tracing::setup_tracing;
use record_client::{DatabaseScope, StoreClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting fruit list demo");

    // A deterministic backend with a small server-side page cap (so
    // retrieval pages) and a visibility lag on creates (so the bridge's
    // confirmation poll has something to do).
    let store = Arc::new(
        MemoryStore::new()
            .with_identity("Demo User")
            .with_max_page_size(2)
            .with_create_visibility_lag(Duration::from_millis(200)),
    );
    let push = store.subscribe_push();

    let system = FruitSystem::new(store.clone(), DatabaseScope::Private, push);

    let span = tracing::info_span!("initial_adds");
    async {
        for name in ["Banana", "Apple", "Cherry"] {
            info!(name, "adding fruit");
            system
                .view_model
                .add_fruit(name)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    let state = system.view_model.state();
    info!(
        fruits = ?state.fruit_names(),
        status = %state.status_text,
        user = %state.user_identity,
        "after adds"
    );

    // Rename by tapping a fruit, the way the UI does it.
    let mut apple = state
        .fruits
        .iter()
        .find(|f| f.name() == "Apple")
        .cloned()
        .ok_or("Apple went missing")?;
    apple.set_name("Apple!");
    system
        .view_model
        .update_fruit(apple)
        .await
        .map_err(|e| e.to_string())?;
    info!(fruits = ?system.view_model.state().fruit_names(), "after update");

    // Swipe-to-delete the first and last rows; offsets are resolved to
    // identifiers before anything moves, so the order does not matter.
    system
        .view_model
        .delete_fruits(vec![2, 0])
        .await
        .map_err(|e| e.to_string())?;
    info!(fruits = ?system.view_model.state().fruit_names(), "after deletes");

    // Another device writes to the same store; the resulting push drives a
    // re-sync once the create is query-visible.
    let other_device = StoreClient::new(store.clone(), DatabaseScope::Private);
    other_device
        .create(&Fruit::with_name("Dragonfruit"))
        .await
        .map_err(|e| e.to_string())?;
    tokio::time::sleep(Duration::from_millis(800)).await;
    info!(fruits = ?system.view_model.state().fruit_names(), "after remote create");

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
