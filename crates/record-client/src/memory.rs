//! # In-Memory Store
//!
//! A deterministic [`RecordStore`] implementation used by the demo binary
//! and by tests. It answers real cursor-paged queries, enforces change-tag
//! conflicts, keeps a subscription registry, and delivers push payloads
//! over a broadcast channel, so the exact code paths that would run against
//! a remote backend run here too.
//!
//! # Testing Support
//!
//! Like a mock client, the store lets tests shape its behavior without a
//! network:
//!
//! - `with_account_status` / `with_permission` / `with_identity` configure
//!   the account handshake responses.
//! - `inject_failure` queues an error for the next call of one operation,
//!   simulating outages that are hard to reproduce with a real backend.
//! - `with_max_page_size` caps pages server-side so cursor following is
//!   exercised even by callers that pass no page limit.
//! - `with_create_visibility_lag` delays query visibility of newly created
//!   records, reproducing the eventual-consistency window between a create
//!   push and the change being visible to a query.
//! - `with_latency` adds a fixed delay to every operation, for timeout
//!   tests.

use crate::error::StoreError;
use crate::query::{Cursor, Filter, Query, QueryPage, SortDirection};
use crate::record::{FieldValue, Record, RecordId};
use crate::store::{
    AccountStatus, Capability, ChangeKind, DatabaseScope, PermissionState, RecordStore,
    Subscription,
};
use async_trait::async_trait;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::debug;

/// Identifies one store operation for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    AccountStatus,
    RequestPermission,
    UserIdentity,
    Save,
    Delete,
    Query,
    Subscribe,
}

struct StoredRow {
    record: Record,
    visible_at: Instant,
}

struct Inner {
    rows: HashMap<(DatabaseScope, String), Vec<StoredRow>>,
    next_tag: u64,
    account_status: AccountStatus,
    permission: PermissionState,
    identity: Option<String>,
    subscriptions: Vec<(DatabaseScope, Subscription)>,
    outcomes: HashMap<StoreOp, VecDeque<Option<StoreError>>>,
    calls: HashMap<StoreOp, u64>,
}

/// Deterministic in-memory record store.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    push_tx: broadcast::Sender<String>,
    max_page_size: usize,
    create_visibility_lag: Duration,
    latency: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (push_tx, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(Inner {
                rows: HashMap::new(),
                next_tag: 1,
                account_status: AccountStatus::Available,
                permission: PermissionState::Granted,
                identity: None,
                subscriptions: Vec::new(),
                outcomes: HashMap::new(),
                calls: HashMap::new(),
            }),
            push_tx,
            max_page_size: 100,
            create_visibility_lag: Duration::ZERO,
            latency: Duration::ZERO,
        }
    }

    pub fn with_account_status(self, status: AccountStatus) -> Self {
        self.lock().account_status = status;
        self
    }

    pub fn with_permission(self, permission: PermissionState) -> Self {
        self.lock().permission = permission;
        self
    }

    pub fn with_identity(self, identity: impl Into<String>) -> Self {
        self.lock().identity = Some(identity.into());
        self
    }

    /// Server-side cap on page size, applied even when the query asks for
    /// more (or for no limit at all).
    pub fn with_max_page_size(mut self, max: usize) -> Self {
        self.max_page_size = max.max(1);
        self
    }

    /// Newly created records stay invisible to queries for this long after
    /// the save, while their create push is delivered immediately.
    pub fn with_create_visibility_lag(mut self, lag: Duration) -> Self {
        self.create_visibility_lag = lag;
        self
    }

    /// Fixed delay added to every operation.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queues `error` for an upcoming call of `op`. Outcomes are consumed
    /// in FIFO order, one per call; an empty queue means success.
    pub fn inject_failure(&self, op: StoreOp, error: StoreError) {
        self.lock()
            .outcomes
            .entry(op)
            .or_default()
            .push_back(Some(error));
    }

    /// Queues an explicit success for an upcoming call of `op`, so a
    /// failure can be positioned at the n-th call.
    pub fn inject_pass(&self, op: StoreOp) {
        self.lock().outcomes.entry(op).or_default().push_back(None);
    }

    /// A receiver for push deliveries. Each matching change produces one
    /// JSON payload, regardless of how many registered subscriptions match.
    pub fn subscribe_push(&self) -> broadcast::Receiver<String> {
        self.push_tx.subscribe()
    }

    /// How many times `op` has been called, successful or not. Lets tests
    /// verify which operations a handshake did (and did not) reach.
    pub fn calls(&self, op: StoreOp) -> u64 {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panicked test thread; propagating the
        // panic is fine here.
        self.inner.lock().unwrap()
    }

    async fn begin(&self, op: StoreOp) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut inner = self.lock();
        *inner.calls.entry(op).or_insert(0) += 1;
        if let Some(Some(error)) = inner.outcomes.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        Ok(())
    }

    fn emit_push(&self, scope: DatabaseScope, kind: ChangeKind, record_type: &str, id: &RecordId) {
        let matched = self
            .lock()
            .subscriptions
            .iter()
            .any(|(s, sub)| *s == scope && sub.record_type == record_type && sub.watches(kind));
        if !matched {
            return;
        }
        let payload = json!({
            "ck": {
                "qry": {
                    "fo": kind.wire_code(),
                    "rid": id.as_str(),
                    "recordType": record_type,
                }
            }
        });
        debug!(record_type, %id, code = kind.wire_code(), "push delivery");
        // No receivers just means nobody is listening yet.
        let _ = self.push_tx.send(payload.to_string());
    }
}

/// Field-value ordering used for query sorts. Values of different kinds
/// group by kind; rows missing the sort field order last.
fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a, b) {
            (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
            (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(y),
            (FieldValue::Float(x), FieldValue::Float(y)) => {
                x.partial_cmp(y).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Bool(x), FieldValue::Bool(y)) => x.cmp(y),
            (FieldValue::Timestamp(x), FieldValue::Timestamp(y)) => x.cmp(y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn kind_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Text(_) => 0,
        FieldValue::Integer(_) => 1,
        FieldValue::Float(_) => 2,
        FieldValue::Bool(_) => 3,
        FieldValue::Timestamp(_) => 4,
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Id(id) => record.id() == id,
        Filter::Field { name, value } => record.get(name) == Some(value),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn account_status(&self) -> Result<AccountStatus, StoreError> {
        self.begin(StoreOp::AccountStatus).await?;
        Ok(self.lock().account_status)
    }

    async fn request_permission(
        &self,
        _capability: Capability,
    ) -> Result<PermissionState, StoreError> {
        self.begin(StoreOp::RequestPermission).await?;
        Ok(self.lock().permission)
    }

    async fn user_identity(&self) -> Result<String, StoreError> {
        self.begin(StoreOp::UserIdentity).await?;
        self.lock()
            .identity
            .clone()
            .ok_or_else(|| StoreError::NotFound("user identity".into()))
    }

    async fn save(&self, scope: DatabaseScope, record: Record) -> Result<Record, StoreError> {
        self.begin(StoreOp::Save).await?;

        let record_type = record.record_type().to_string();
        let id = record.id().clone();
        let (saved, kind) = {
            let mut inner = self.lock();
            let tag = inner.next_tag;
            inner.next_tag += 1;
            let rows = inner
                .rows
                .entry((scope, record_type.clone()))
                .or_default();

            match rows.iter_mut().find(|row| row.record.id() == &id) {
                Some(existing) => {
                    if existing.record.change_tag() != record.change_tag() {
                        return Err(StoreError::Conflict(id.to_string()));
                    }
                    let mut saved = record;
                    saved.set_change_tag(tag);
                    existing.record = saved.clone();
                    (saved, ChangeKind::Update)
                }
                None => {
                    let mut saved = record;
                    saved.set_change_tag(tag);
                    rows.push(StoredRow {
                        record: saved.clone(),
                        visible_at: Instant::now() + self.create_visibility_lag,
                    });
                    (saved, ChangeKind::Create)
                }
            }
        };

        self.emit_push(scope, kind, &record_type, &id);
        Ok(saved)
    }

    async fn delete(&self, scope: DatabaseScope, id: &RecordId) -> Result<(), StoreError> {
        self.begin(StoreOp::Delete).await?;

        let record_type = {
            let mut inner = self.lock();
            let mut found = None;
            for ((row_scope, record_type), rows) in inner.rows.iter_mut() {
                if *row_scope != scope {
                    continue;
                }
                if let Some(pos) = rows.iter().position(|row| row.record.id() == id) {
                    rows.remove(pos);
                    found = Some(record_type.clone());
                    break;
                }
            }
            found.ok_or_else(|| StoreError::NotFound(id.to_string()))?
        };

        self.emit_push(scope, ChangeKind::Delete, &record_type, id);
        Ok(())
    }

    async fn query(
        &self,
        scope: DatabaseScope,
        query: &Query,
        cursor: Option<Cursor>,
    ) -> Result<QueryPage, StoreError> {
        self.begin(StoreOp::Query).await?;

        let offset = match cursor {
            Some(Cursor(raw)) => raw
                .parse::<usize>()
                .map_err(|_| StoreError::Transport(format!("invalid cursor: {raw}")))?,
            None => 0,
        };

        let now = Instant::now();
        let inner = self.lock();
        let mut matched: Vec<Record> = inner
            .rows
            .get(&(scope, query.record_type.clone()))
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.visible_at <= now)
                    .filter(|row| matches_filter(&row.record, &query.filter))
                    .map(|row| row.record.clone())
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(&sort.field), b.get(&sort.field));
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        let limit = query
            .page_limit
            .unwrap_or(self.max_page_size)
            .min(self.max_page_size)
            .max(1);
        let total = matched.len();
        let records: Vec<Record> = matched.into_iter().skip(offset).take(limit).collect();
        let next = offset + records.len();
        let cursor = (next < total).then(|| Cursor(next.to_string()));

        Ok(QueryPage { records, cursor })
    }

    async fn subscribe(
        &self,
        scope: DatabaseScope,
        subscription: Subscription,
    ) -> Result<(), StoreError> {
        self.begin(StoreOp::Subscribe).await?;

        let mut inner = self.lock();
        if let Some(id) = &subscription.id {
            // Re-registering a named subscription replaces it.
            inner
                .subscriptions
                .retain(|(s, sub)| !(*s == scope && sub.id.as_deref() == Some(id.as_str())));
        }
        inner.subscriptions.push((scope, subscription));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortBy;

    fn fruit(name: &str) -> Record {
        let mut record = Record::new("Fruits");
        record.set("name", FieldValue::Text(name.into()));
        record
    }

    #[tokio::test]
    async fn save_assigns_change_tags_and_detects_stale_saves() {
        let store = MemoryStore::new();
        let scope = DatabaseScope::Private;

        let saved = store.save(scope, fruit("Apple")).await.unwrap();
        assert!(saved.change_tag().is_some());

        // A second writer saves the same record, bumping the tag.
        let mut theirs = saved.clone();
        theirs.set("name", FieldValue::Text("Apricot".into()));
        store.save(scope, theirs).await.unwrap();

        // Our copy now carries a stale tag.
        let mut ours = saved;
        ours.set("name", FieldValue::Text("Avocado".into()));
        let result = store.save(scope, ours).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn query_pages_slice_without_overlap() {
        let store = MemoryStore::new();
        let scope = DatabaseScope::Private;
        for name in ["Cherry", "Apple", "Banana", "Date", "Elderberry"] {
            store.save(scope, fruit(name)).await.unwrap();
        }

        let query = Query::new("Fruits")
            .sort(SortBy::ascending("name"))
            .page_limit(2);

        let first = store.query(scope, &query, None).await.unwrap();
        assert_eq!(first.records.len(), 2);
        let second = store
            .query(scope, &query, first.cursor.clone())
            .await
            .unwrap();
        assert_eq!(second.records.len(), 2);
        let third = store.query(scope, &query, second.cursor.clone()).await.unwrap();
        assert_eq!(third.records.len(), 1);
        assert!(third.cursor.is_none());

        let names: Vec<&str> = first
            .records
            .iter()
            .chain(&second.records)
            .chain(&third.records)
            .map(|r| r.text("name").unwrap())
            .collect();
        assert_eq!(names, ["Apple", "Banana", "Cherry", "Date", "Elderberry"]);
    }

    #[tokio::test]
    async fn delete_of_absent_record_reports_not_found() {
        let store = MemoryStore::new();
        let record = fruit("Apple");
        let result = store
            .delete(DatabaseScope::Private, record.id())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn injected_failure_is_consumed_once() {
        let store = MemoryStore::new();
        store.inject_failure(StoreOp::Query, StoreError::Transport("flaky".into()));

        let query = Query::new("Fruits");
        let first = store.query(DatabaseScope::Private, &query, None).await;
        assert!(matches!(first, Err(StoreError::Transport(_))));

        let second = store.query(DatabaseScope::Private, &query, None).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn matching_change_delivers_one_push() {
        let store = MemoryStore::new();
        let scope = DatabaseScope::Private;
        let mut rx = store.subscribe_push();

        // Two overlapping subscriptions still yield a single delivery.
        store
            .subscribe(scope, Subscription::all_changes("Fruits"))
            .await
            .unwrap();
        store
            .subscribe(scope, Subscription::on_create("fruit_added", "Fruits"))
            .await
            .unwrap();

        store.save(scope, fruit("Apple")).await.unwrap();

        let payload = rx.try_recv().unwrap();
        assert!(payload.contains("\"fo\":1"));
        assert!(rx.try_recv().is_err());
    }
}
