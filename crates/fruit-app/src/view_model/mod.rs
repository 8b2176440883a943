//! # View Model
//!
//! The fruit list view model, split into the actor pattern's two halves:
//!
//! - [`ViewModelActor`] - owns the [`ViewState`] and processes requests
//!   sequentially in its own task (one logical writer, no locks)
//! - [`ViewModelHandle`] - the cloneable interface a frontend calls:
//!   `add_fruit`, `update_fruit`, `delete_fruits`, `refresh`, and snapshot
//!   observation via a watch channel
//!
//! The actor is explicitly constructed and dependency-injected with the
//! [`StoreClient`] it should talk through; dropping every handle shuts it
//! down.
//!
//! ## Usage
//!
//! ```rust
//! use fruit_app::view_model;
//! use record_client::memory::MemoryStore;
//! use record_client::{DatabaseScope, StoreClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fruit_app::error::FruitError> {
//!     let store = Arc::new(MemoryStore::new());
//!     let client = StoreClient::new(store, DatabaseScope::Private);
//!
//!     let (actor, handle) = view_model::new(client);
//!     tokio::spawn(actor.run());
//!
//!     handle.add_fruit("Apple").await?;
//!     assert_eq!(handle.state().fruit_names(), ["Apple"]);
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod handle;
pub mod message;
pub mod state;

pub use actor::{ViewModelActor, CREATE_SUBSCRIPTION_ID};
pub use handle::ViewModelHandle;
pub use message::ViewModelRequest;
pub use state::ViewState;

use record_client::StoreClient;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Creates a new view model actor and its handle.
///
/// The actor must be started with [`ViewModelActor::run`], typically on its
/// own task; the handle can then be cloned and shared freely.
pub fn new(client: StoreClient) -> (ViewModelActor, ViewModelHandle) {
    let (sender, receiver) = mpsc::channel(32);
    let (state_tx, state_rx) = watch::channel(ViewState::default());
    let refresh_pending = Arc::new(AtomicBool::new(false));

    let actor = ViewModelActor::new(receiver, client, state_tx, refresh_pending.clone());
    let handle = ViewModelHandle::new(sender, state_rx, refresh_pending);
    (actor, handle)
}
