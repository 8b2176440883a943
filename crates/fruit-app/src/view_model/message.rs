//! Request messages processed by the view model actor.

use crate::error::FruitError;
use crate::model::Fruit;
use tokio::sync::oneshot;

/// One-shot response channel for a view model request.
pub type Respond<T> = oneshot::Sender<Result<T, FruitError>>;

/// Internal message type sent from the handle to the actor.
///
/// Each variant carries its payload and a `respond_to` channel; the actor
/// answers exactly once per request, after the remote call has settled and
/// local state has been reconciled.
#[derive(Debug)]
pub enum ViewModelRequest {
    AddFruit {
        name: String,
        respond_to: Respond<()>,
    },
    UpdateFruit {
        fruit: Fruit,
        respond_to: Respond<()>,
    },
    DeleteFruits {
        offsets: Vec<usize>,
        respond_to: Respond<()>,
    },
    Refresh {
        respond_to: Respond<()>,
    },
}
