//! # Store Client
//!
//! [`StoreClient`] translates domain operations into remote-store calls and
//! hides the pagination and continuation plumbing. It is generic over any
//! entity implementing [`Storable`], cheap to clone, and safe to share
//! across tasks.
//!
//! Three policies live here rather than in callers:
//!
//! - **Pagination**: `retrieve` follows query cursors in a loop until the
//!   store reports no further page, so a page limit only bounds one round
//!   trip, never the overall result.
//! - **Retry**: idempotent operations (status check, identity lookup,
//!   delete, each query page) retry transport failures with exponential
//!   backoff. Saves are not idempotent under change-tag concurrency and are
//!   never retried.
//! - **Timeout**: every store round trip is bounded by a fixed request
//!   timeout; expiry is classified as a transport failure.

use crate::entity::Storable;
use crate::error::StoreError;
use crate::query::{Cursor, Filter, Query};
use crate::record::{Record, RecordId};
use crate::store::{
    AccountStatus, Capability, DatabaseScope, PermissionState, RecordStore, Subscription,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Backoff policy for retried operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

/// Client-wide policies.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// A type-safe client for a [`RecordStore`] database partition.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn RecordStore>,
    scope: DatabaseScope,
    config: ClientConfig,
}

impl StoreClient {
    pub fn new(store: Arc<dyn RecordStore>, scope: DatabaseScope) -> Self {
        Self::with_config(store, scope, ClientConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RecordStore>,
        scope: DatabaseScope,
        config: ClientConfig,
    ) -> Self {
        Self {
            store,
            scope,
            config,
        }
    }

    pub fn scope(&self) -> DatabaseScope {
        self.scope
    }

    /// Runs one store round trip under the request timeout.
    async fn round_trip<T, F, Fut>(&self, f: &F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.request_timeout, f()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Transport("request timed out".into())),
        }
    }

    /// Runs an idempotent round trip, retrying transport failures with
    /// exponential backoff.
    async fn with_retry<T, F, Fut>(&self, op: &str, f: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.round_trip(&f).await {
                Err(StoreError::Transport(msg)) if attempt < self.config.retry.max_attempts => {
                    let delay = self.config.retry.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(op, attempt, error = %msg, delay_ms = delay.as_millis() as u64, "transient failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    // --- Non-CRUD Operations ---

    /// Queries whether the active account is usable.
    #[instrument(skip(self))]
    pub async fn account_status(&self) -> Result<AccountStatus, StoreError> {
        self.with_retry("account_status", || self.store.account_status())
            .await
    }

    /// Human-readable account status, suitable for direct display.
    pub async fn status_text(&self) -> Result<&'static str, StoreError> {
        Ok(self.account_status().await?.as_text())
    }

    /// One-shot consent prompt. Not retried: a repeated prompt needs an
    /// explicit re-trigger from the UI, never an automatic one.
    #[instrument(skip(self))]
    pub async fn request_permission(
        &self,
        capability: Capability,
    ) -> Result<PermissionState, StoreError> {
        debug!("Sending request");
        self.round_trip(&|| self.store.request_permission(capability))
            .await
    }

    /// Resolves the account's display name. Fails with
    /// [`StoreError::NotFound`] when the account exposes no identity
    /// components; callers usually treat that as an empty name.
    #[instrument(skip(self))]
    pub async fn user_identity(&self) -> Result<String, StoreError> {
        self.with_retry("user_identity", || self.store.user_identity())
            .await
    }

    /// Registers a standing subscription for push delivery.
    #[instrument(skip(self, subscription), fields(record_type = %subscription.record_type))]
    pub async fn subscribe(&self, subscription: Subscription) -> Result<(), StoreError> {
        debug!("Sending request");
        self.round_trip(&|| self.store.subscribe(self.scope, subscription.clone()))
            .await
    }

    // --- CRUD Operations ---

    /// "C" in CRUD. Saves the entity's backing record and returns the
    /// stored record with its fresh change tag.
    #[instrument(skip(self, item))]
    pub async fn create<T: Storable>(&self, item: &T) -> Result<Record, StoreError> {
        self.save_record(item.record().clone()).await
    }

    /// "R" in CRUD. Executes a query, transparently following pagination
    /// cursors until exhausted, and decodes every record. Any page failure
    /// or decode failure discards the partial results already accumulated.
    #[instrument(skip(self, query), fields(record_type = %query.record_type))]
    pub async fn retrieve<T: Storable>(&self, query: Query) -> Result<Vec<T>, StoreError> {
        let mut entities: Vec<T> = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let page = self
                .with_retry("query", || {
                    self.store.query(self.scope, &query, cursor.clone())
                })
                .await?;
            for record in page.records {
                entities.push(T::from_record(record)?);
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!(count = entities.len(), "retrieve complete");
        Ok(entities)
    }

    /// "U" in CRUD. Same save semantics as [`StoreClient::create`]: a save
    /// of an existing identifier overwrites, a fresh identifier inserts.
    #[instrument(skip(self, item))]
    pub async fn update<T: Storable>(&self, item: &T) -> Result<Record, StoreError> {
        self.save_record(item.record().clone()).await
    }

    /// "D" in CRUD. Removes the entity's record by identifier. A record
    /// that is already absent counts as success.
    #[instrument(skip(self, item))]
    pub async fn delete<T: Storable>(&self, item: &T) -> Result<(), StoreError> {
        self.delete_by_id(item.record().id()).await
    }

    /// Removes a record by identifier, treating an already-absent record as
    /// success.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &RecordId) -> Result<(), StoreError> {
        match self
            .with_retry("delete", || self.store.delete(self.scope, id))
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => {
                debug!(%id, "already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a record is currently visible to queries. Used to confirm
    /// that a pushed create has become consistent before a re-sync.
    #[instrument(skip(self))]
    pub async fn record_visible(
        &self,
        record_type: &str,
        id: &RecordId,
    ) -> Result<bool, StoreError> {
        let query = Query::new(record_type)
            .filter(Filter::Id(id.clone()))
            .page_limit(1);
        let page = self
            .with_retry("query", || self.store.query(self.scope, &query, None))
            .await?;
        Ok(!page.records.is_empty())
    }

    /// Saves are not retried: a save observed as failed may still have been
    /// applied, and replaying it with the old change tag would either
    /// double-apply or spuriously conflict.
    async fn save_record(&self, record: Record) -> Result<Record, StoreError> {
        debug!(id = %record.id(), record_type = record.record_type(), "saving record");
        self.round_trip(&|| self.store.save(self.scope, record.clone()))
            .await
    }
}
