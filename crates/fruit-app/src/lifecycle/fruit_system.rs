use crate::notifications::{BridgeConfig, NotificationBridge};
use crate::view_model::{self, ViewModelHandle};
use record_client::{DatabaseScope, RecordStore, StoreClient};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tracing::{error, info};

/// The runtime orchestrator for the fruit list system.
///
/// Owns the running tasks and the handles needed to use and to stop them.
/// Construct one per backing store; there is no shared global instance.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(MemoryStore::new());
/// let system = FruitSystem::new(store.clone(), DatabaseScope::Private, store.subscribe_push());
///
/// system.view_model.add_fruit("Apple").await?;
///
/// system.shutdown().await?;
/// ```
pub struct FruitSystem {
    /// Handle for driving the fruit list.
    pub view_model: ViewModelHandle,

    /// The underlying store client, for callers that need raw operations.
    pub client: StoreClient,

    /// Task handles for the actor and the bridge, awaited on shutdown.
    handles: Vec<tokio::task::JoinHandle<()>>,

    bridge_shutdown: oneshot::Sender<()>,
}

impl FruitSystem {
    /// Creates and starts a complete system against the given store and
    /// database scope, consuming push deliveries from `push`.
    pub fn new(
        store: Arc<dyn RecordStore>,
        scope: DatabaseScope,
        push: broadcast::Receiver<String>,
    ) -> Self {
        Self::with_config(store, scope, push, BridgeConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RecordStore>,
        scope: DatabaseScope,
        push: broadcast::Receiver<String>,
        bridge_config: BridgeConfig,
    ) -> Self {
        let client = StoreClient::new(store, scope);

        // 1. View model actor: handshake + event loop on its own task.
        let (actor, view_model) = view_model::new(client.clone());
        let actor_handle = tokio::spawn(actor.run());

        // 2. Notification bridge: subscription registration + push loop.
        let bridge =
            NotificationBridge::with_config(client.clone(), view_model.clone(), bridge_config);
        let (bridge_shutdown, shutdown_rx) = oneshot::channel();
        let bridge_handle = bridge.spawn(push, shutdown_rx);

        Self {
            view_model,
            client,
            handles: vec![actor_handle, bridge_handle],
            bridge_shutdown,
        }
    }

    /// Gracefully shuts down the system: stops the bridge, closes the view
    /// model channel, and waits for both tasks to finish.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("shutting down fruit system");

        let FruitSystem {
            view_model,
            client,
            handles,
            bridge_shutdown,
        } = self;

        // Stop the bridge first so its view model handle clone is released
        // and the actor's channel can actually close.
        let _ = bridge_shutdown.send(());
        drop(view_model);
        drop(client);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("task failed: {e:?}");
                return Err(format!("task failed: {e:?}"));
            }
        }

        info!("fruit system shutdown complete");
        Ok(())
    }
}
