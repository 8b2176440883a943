//! # View Model Handle
//!
//! The client half of the view model: a cheap-to-clone, type-safe handle
//! that forwards requests to the actor over an mpsc channel and observes
//! published [`ViewState`] snapshots through a watch channel.

use crate::error::FruitError;
use crate::model::Fruit;
use crate::view_model::message::ViewModelRequest;
use crate::view_model::state::ViewState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

/// Handle for interacting with the view model actor.
#[derive(Clone)]
pub struct ViewModelHandle {
    sender: mpsc::Sender<ViewModelRequest>,
    state_rx: watch::Receiver<ViewState>,
    refresh_pending: Arc<AtomicBool>,
}

impl ViewModelHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<ViewModelRequest>,
        state_rx: watch::Receiver<ViewState>,
        refresh_pending: Arc<AtomicBool>,
    ) -> Self {
        Self {
            sender,
            state_rx,
            refresh_pending,
        }
    }

    /// Adds a fruit with the given name. The list shows it immediately;
    /// when the remote create fails, the entry is rolled back and the error
    /// returned.
    pub async fn add_fruit(&self, name: impl Into<String>) -> Result<(), FruitError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ViewModelRequest::AddFruit {
                name: name.into(),
                respond_to,
            })
            .await
            .map_err(|_| FruitError::ViewModelClosed)?;
        response.await.map_err(|_| FruitError::ViewModelClosed)?
    }

    /// Pushes the fruit's current field values to the store, then replaces
    /// the matching local entry.
    pub async fn update_fruit(&self, fruit: Fruit) -> Result<(), FruitError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ViewModelRequest::UpdateFruit { fruit, respond_to })
            .await
            .map_err(|_| FruitError::ViewModelClosed)?;
        response.await.map_err(|_| FruitError::ViewModelClosed)?
    }

    /// Deletes the fruits at the given list offsets. Offsets may come in
    /// any order; they are resolved against the current list before any
    /// entry moves.
    pub async fn delete_fruits(&self, offsets: Vec<usize>) -> Result<(), FruitError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ViewModelRequest::DeleteFruits { offsets, respond_to })
            .await
            .map_err(|_| FruitError::ViewModelClosed)?;
        response.await.map_err(|_| FruitError::ViewModelClosed)?
    }

    /// Re-retrieves the list and replaces local state. A refresh requested
    /// while another is already queued coalesces into it and returns
    /// immediately.
    pub async fn refresh(&self) -> Result<(), FruitError> {
        if self.refresh_pending.swap(true, Ordering::SeqCst) {
            debug!("refresh already pending, coalescing");
            return Ok(());
        }
        let (respond_to, response) = oneshot::channel();
        match self
            .sender
            .send(ViewModelRequest::Refresh { respond_to })
            .await
        {
            Ok(()) => response.await.map_err(|_| FruitError::ViewModelClosed)?,
            Err(_) => {
                self.refresh_pending.store(false, Ordering::SeqCst);
                Err(FruitError::ViewModelClosed)
            }
        }
    }

    /// The latest published snapshot.
    pub fn state(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    /// A watch receiver for observing snapshot changes.
    pub fn watch(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }
}
