//! # View Model Actor
//!
//! The server half of the view model. It owns the [`ViewState`] and
//! processes requests sequentially in its own task, so every mutation of
//! the observable state happens on one logical writer with no locks.
//!
//! On startup the actor runs the account handshake in strict order,
//! short-circuiting on failure or a negative result at each step:
//! account status → permission → identity (non-fatal) → subscription
//! registration (non-fatal) → initial retrieval.

use crate::error::FruitError;
use crate::model::Fruit;
use crate::view_model::message::ViewModelRequest;
use crate::view_model::state::ViewState;
use record_client::{
    AccountStatus, Capability, PermissionState, Query, SortBy, Storable, StoreClient, Subscription,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Stable identifier of the creation subscription registered at startup.
pub const CREATE_SUBSCRIPTION_ID: &str = "fruit_added";

/// The actor that owns the fruit list state.
pub struct ViewModelActor {
    receiver: mpsc::Receiver<ViewModelRequest>,
    client: StoreClient,
    state: ViewState,
    state_tx: watch::Sender<ViewState>,
    refresh_pending: Arc<AtomicBool>,
}

impl ViewModelActor {
    pub(crate) fn new(
        receiver: mpsc::Receiver<ViewModelRequest>,
        client: StoreClient,
        state_tx: watch::Sender<ViewState>,
        refresh_pending: Arc<AtomicBool>,
    ) -> Self {
        Self {
            receiver,
            client,
            state: ViewState::default(),
            state_tx,
            refresh_pending,
        }
    }

    /// Runs the startup handshake, then the event loop, until every handle
    /// has been dropped.
    pub async fn run(mut self) {
        info!("view model started");
        self.startup().await;

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ViewModelRequest::AddFruit { name, respond_to } => {
                    debug!(%name, "AddFruit");
                    let result = self.add_fruit(name).await;
                    let _ = respond_to.send(result);
                }
                ViewModelRequest::UpdateFruit { fruit, respond_to } => {
                    debug!(id = %fruit.record().id(), "UpdateFruit");
                    let result = self.update_fruit(fruit).await;
                    let _ = respond_to.send(result);
                }
                ViewModelRequest::DeleteFruits { offsets, respond_to } => {
                    debug!(?offsets, "DeleteFruits");
                    let result = self.delete_fruits(offsets).await;
                    let _ = respond_to.send(result);
                }
                ViewModelRequest::Refresh { respond_to } => {
                    debug!("Refresh");
                    // Requests arriving from here on need a new refresh.
                    self.refresh_pending.store(false, Ordering::SeqCst);
                    let result = self.refresh().await;
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(fruits = self.state.fruits.len(), "view model shutdown");
    }

    async fn startup(&mut self) {
        let status = match self.client.account_status().await {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "account status check failed");
                self.state.message = format!("account status check failed: {e}");
                self.publish();
                return;
            }
        };
        self.state.account_status = Some(status);
        self.state.status_text = status.as_text().to_string();
        self.publish();
        if status != AccountStatus::Available {
            info!(status = status.as_text(), "account not available");
            return;
        }

        let permission = match self
            .client
            .request_permission(Capability::UserDiscoverability)
            .await
        {
            Ok(permission) => permission,
            Err(e) => {
                error!(error = %e, "permission request failed");
                self.state.message = format!("permission request failed: {e}");
                self.publish();
                return;
            }
        };
        self.state.have_permission = permission == PermissionState::Granted;
        self.publish();
        if !self.state.have_permission {
            info!(?permission, "user discoverability not granted");
            return;
        }

        // A missing identity is non-fatal; the display name stays empty.
        match self.client.user_identity().await {
            Ok(identity) => {
                self.state.user_identity = identity;
                self.publish();
            }
            Err(e) => warn!(error = %e, "user identity unavailable"),
        }

        // Registration failures limit push delivery but not the list.
        let subscription = Subscription::on_create(CREATE_SUBSCRIPTION_ID, Fruit::record_type());
        if let Err(e) = self.client.subscribe(subscription).await {
            warn!(error = %e, "subscription registration failed");
        }

        if let Err(e) = self.refresh().await {
            error!(error = %e, "initial retrieval failed");
        }
    }

    async fn add_fruit(&mut self, name: String) -> Result<(), FruitError> {
        let fruit = Fruit::with_name(&name);
        let id = fruit.record().id().clone();

        // Optimistic insert at the sorted position.
        let pos = self
            .state
            .fruits
            .iter()
            .position(|f| f.name() > fruit.name())
            .unwrap_or(self.state.fruits.len());
        self.state.fruits.insert(pos, fruit.clone());
        self.publish();

        match self.client.create(&fruit).await {
            Ok(saved) => {
                if let Some(entry) = self.state.fruits.iter_mut().find(|f| f.record().id() == &id) {
                    entry.set_record(saved);
                }
                self.publish();
                Ok(())
            }
            Err(e) => {
                self.state.fruits.retain(|f| f.record().id() != &id);
                self.state.message = format!("failed to add {name}: {e}");
                self.publish();
                Err(e.into())
            }
        }
    }

    async fn update_fruit(&mut self, fruit: Fruit) -> Result<(), FruitError> {
        let saved = match self.client.update(&fruit).await {
            Ok(saved) => saved,
            Err(e) => {
                self.state.message = format!("failed to update {}: {e}", fruit.name());
                self.publish();
                return Err(e.into());
            }
        };

        let id = saved.id().clone();
        match self
            .state
            .fruits
            .iter_mut()
            .find(|f| f.record().id() == &id)
        {
            Some(entry) => {
                entry.set_record(saved);
                // A rename can move the entry.
                self.state.fruits.sort_by(|a, b| a.name().cmp(b.name()));
                self.publish();
                Ok(())
            }
            None => {
                // This should never happen: the entity was updated remotely
                // but is missing locally, so local state has drifted.
                error!(%id, "updated fruit missing from local state");
                self.state.message = format!("updated fruit {id} missing from local state");
                self.publish();
                Err(FruitError::NotFound(id.to_string()))
            }
        }
    }

    async fn delete_fruits(&mut self, offsets: Vec<usize>) -> Result<(), FruitError> {
        // Offsets shift as entries are removed; resolve them to stable
        // identifiers before anything moves.
        let mut ids = Vec::with_capacity(offsets.len());
        for offset in offsets {
            match self.state.fruits.get(offset) {
                Some(fruit) => ids.push(fruit.record().id().clone()),
                None => warn!(offset, "delete offset out of range"),
            }
        }

        // Sequential, never concurrent: each local removal follows its own
        // confirmed remote delete.
        for id in ids {
            if let Err(e) = self.client.delete_by_id(&id).await {
                self.state.message = format!("failed to delete fruit: {e}");
                self.publish();
                return Err(e.into());
            }
            self.state.fruits.retain(|f| f.record().id() != &id);
            self.publish();
        }
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), FruitError> {
        let query = Query::new(Fruit::record_type()).sort(SortBy::ascending("name"));
        match self.client.retrieve::<Fruit>(query).await {
            Ok(fruits) => {
                self.state.fruits = fruits;
                self.publish();
                Ok(())
            }
            Err(e) => {
                self.state.message = format!("retrieve failed: {e}");
                self.publish();
                Err(FruitError::Store(e))
            }
        }
    }

    fn publish(&self) {
        // Send only fails when every receiver is gone; the actor keeps
        // running for the request channel regardless.
        let _ = self.state_tx.send(self.state.clone());
    }
}
