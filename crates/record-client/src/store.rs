//! # RecordStore Trait
//!
//! The [`RecordStore`] trait is the seam between the client and a concrete
//! managed record store. The remote backend is a black box reachable only
//! through these operations: account status, permission prompt, identity
//! lookup, record save/delete, cursor-paged query, and subscription
//! registration.
//!
//! # Architecture Note
//! By defining a contract here, the [`StoreClient`](crate::StoreClient) and
//! everything above it stay backend-agnostic. The in-memory implementation
//! in [`memory`](crate::memory) drives the same code paths in tests and in
//! the demo that a remote backend would in production.

use crate::error::StoreError;
use crate::query::{Cursor, Query, QueryPage};
use crate::record::{Record, RecordId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which database partition of the store to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseScope {
    /// Records shared across all accounts.
    Public,
    /// Records visible only to the active account.
    Private,
}

/// Usability of the active account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Available,
    NoAccount,
    Restricted,
    CouldNotDetermine,
    TemporarilyUnavailable,
}

impl AccountStatus {
    /// Human-readable status text, suitable for direct display.
    pub fn as_text(&self) -> &'static str {
        match self {
            AccountStatus::Available => "available",
            AccountStatus::NoAccount => "no account",
            AccountStatus::Restricted => "restricted",
            AccountStatus::CouldNotDetermine => "could not determine",
            AccountStatus::TemporarilyUnavailable => "temporarily unavailable",
        }
    }
}

/// A capability the user can be asked to consent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Permission to look up the account's human-readable identity.
    UserDiscoverability,
}

/// Outcome of a one-shot permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    CouldNotComplete,
}

/// Kind of record change a subscription watches for.
///
/// The wire codes (1 = create, 2 = update, 3 = delete) match the
/// operation-type field carried by push deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn wire_code(&self) -> u8 {
        match self {
            ChangeKind::Create => 1,
            ChangeKind::Update => 2,
            ChangeKind::Delete => 3,
        }
    }

    pub fn from_wire_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ChangeKind::Create),
            2 => Some(ChangeKind::Update),
            3 => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// A standing server-side watch that triggers push delivery on matching
/// changes. Registration is fire-and-forget; the store delivers matching
/// changes out of band, the client never polls.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// Stable subscription identifier; `None` lets the store assign one.
    pub id: Option<String>,
    pub record_type: String,
    pub change_kinds: Vec<ChangeKind>,
    /// Ask for silent content-available delivery rather than a user-facing
    /// alert.
    pub content_available: bool,
}

impl Subscription {
    /// A subscription watching every change kind for a record type.
    pub fn all_changes(record_type: impl Into<String>) -> Self {
        Self {
            id: None,
            record_type: record_type.into(),
            change_kinds: vec![ChangeKind::Create, ChangeKind::Update, ChangeKind::Delete],
            content_available: true,
        }
    }

    /// A named subscription watching record creation only.
    pub fn on_create(id: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            record_type: record_type.into(),
            change_kinds: vec![ChangeKind::Create],
            content_available: true,
        }
    }

    pub fn watches(&self, kind: ChangeKind) -> bool {
        self.change_kinds.contains(&kind)
    }
}

/// Backend contract for a managed record store.
///
/// All operations are asynchronous round trips and may fail with
/// [`StoreError::Transport`]. Saves enforce optimistic concurrency via the
/// record's change tag; `delete` fails with [`StoreError::NotFound`] when
/// the record is already absent (callers typically treat that as success).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Queries whether the active account is usable.
    async fn account_status(&self) -> Result<AccountStatus, StoreError>;

    /// One-shot user consent prompt for a capability. Must not be invoked
    /// more than once per capability per session without an external
    /// re-trigger.
    async fn request_permission(&self, capability: Capability)
        -> Result<PermissionState, StoreError>;

    /// Resolves the active account's human-readable display name. Fails
    /// with [`StoreError::NotFound`] when the account exposes no identity
    /// components.
    async fn user_identity(&self) -> Result<String, StoreError>;

    /// Saves a record (insert for a fresh identifier, overwrite for an
    /// existing one) and returns the stored record carrying its new change
    /// tag. Fails with [`StoreError::Conflict`] when the incoming change
    /// tag is stale.
    async fn save(&self, scope: DatabaseScope, record: Record) -> Result<Record, StoreError>;

    /// Removes a record by identifier.
    async fn delete(&self, scope: DatabaseScope, id: &RecordId) -> Result<(), StoreError>;

    /// Answers one page of a query, starting from `cursor` when given.
    async fn query(
        &self,
        scope: DatabaseScope,
        query: &Query,
        cursor: Option<Cursor>,
    ) -> Result<QueryPage, StoreError>;

    /// Registers a standing subscription.
    async fn subscribe(
        &self,
        scope: DatabaseScope,
        subscription: Subscription,
    ) -> Result<(), StoreError>;
}
