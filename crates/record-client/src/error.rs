//! # Store Errors
//!
//! This module defines the common error type used throughout the record
//! store client. By centralizing error definitions, we ensure consistent
//! error handling across the client, the backend trait, and callers.

use thiserror::Error;

/// Errors that can occur while talking to a record store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// A network or backend failure, including request timeouts.
    #[error("transport error: {0}")]
    Transport(String),

    /// The account lacks (or was denied) a required capability.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The addressed record, identity, or subscription does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend detected a concurrent modification of the record.
    /// The save carried a stale change tag and was rejected.
    #[error("conflicting save for record {0}")]
    Conflict(String),

    /// A record could not be decoded into the requested entity type.
    #[error("record decode error: {0}")]
    Decode(String),

    /// The store (or an internal channel) has shut down.
    #[error("store closed")]
    Closed,
}

impl From<String> for StoreError {
    fn from(msg: String) -> Self {
        StoreError::Transport(msg)
    }
}
