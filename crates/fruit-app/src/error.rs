//! Error types for the fruit list application.

use record_client::StoreError;
use thiserror::Error;

/// Errors that can occur during fruit list operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FruitError {
    /// The record store rejected or failed an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The addressed fruit is missing from local state. Reachable only when
    /// local state has drifted from the store.
    #[error("fruit not found: {0}")]
    NotFound(String),

    /// A push delivery could not be decoded.
    #[error("malformed push payload: {0}")]
    MalformedPush(String),

    /// The view model actor has shut down.
    #[error("view model closed")]
    ViewModelClosed,
}
