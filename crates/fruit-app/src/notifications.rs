//! # Notification Bridge
//!
//! Converts asynchronous push deliveries from the record store into
//! re-sync triggers for the view model, and performs the one-time
//! registration of the standing subscription once the push channel is live.
//!
//! A push payload nests the operation-type code under `ck.qry.fo`
//! (1 = create, 2 = update, 3 = delete) together with the changed record's
//! identifier. Updates and deletes are already query-visible when the push
//! arrives, so the bridge re-syncs immediately. A pushed create may still be
//! inside the store's eventual-consistency window; the bridge confirms the
//! record has become query-visible (bounded poll) before re-syncing instead
//! of sleeping a fixed interval and hoping.

use crate::error::FruitError;
use crate::model::Fruit;
use crate::view_model::ViewModelHandle;
use record_client::{ChangeKind, RecordId, Storable, StoreClient, Subscription};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PushPayload {
    ck: CloudPayload,
}

#[derive(Debug, Deserialize)]
struct CloudPayload {
    qry: QueryNotification,
}

#[derive(Debug, Deserialize)]
struct QueryNotification {
    /// Operation-type code: 1 = create, 2 = update, 3 = delete.
    fo: u8,
    /// Identifier of the changed record.
    rid: String,
    #[serde(rename = "recordType")]
    record_type: Option<String>,
}

/// A decoded push delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub kind: ChangeKind,
    pub record_id: RecordId,
    pub record_type: Option<String>,
}

/// Decodes the nested push payload wire shape.
pub fn parse_push(payload: &str) -> Result<PushEvent, FruitError> {
    let parsed: PushPayload = serde_json::from_str(payload)
        .map_err(|e| FruitError::MalformedPush(e.to_string()))?;
    let qry = parsed.ck.qry;
    let kind = ChangeKind::from_wire_code(qry.fo)
        .ok_or_else(|| FruitError::MalformedPush(format!("unknown operation code {}", qry.fo)))?;
    Ok(PushEvent {
        kind,
        record_id: RecordId::from(qry.rid.as_str()),
        record_type: qry.record_type,
    })
}

/// Policy for confirming that a pushed create has become query-visible.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub poll_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 10,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Bridges push deliveries to view model re-syncs.
pub struct NotificationBridge {
    client: StoreClient,
    view_model: ViewModelHandle,
    config: BridgeConfig,
}

impl NotificationBridge {
    pub fn new(client: StoreClient, view_model: ViewModelHandle) -> Self {
        Self::with_config(client, view_model, BridgeConfig::default())
    }

    pub fn with_config(
        client: StoreClient,
        view_model: ViewModelHandle,
        config: BridgeConfig,
    ) -> Self {
        Self {
            client,
            view_model,
            config,
        }
    }

    /// One-time registration of the standing subscription for the watched
    /// record type, run when push delivery becomes available.
    pub async fn register(&self) -> Result<(), FruitError> {
        self.client
            .subscribe(Subscription::all_changes(Fruit::record_type()))
            .await?;
        Ok(())
    }

    /// Spawns the bridge task: registers the subscription, then converts
    /// each delivery into a re-sync until shut down or the push channel
    /// closes.
    pub fn spawn(
        self,
        receiver: broadcast::Receiver<String>,
        shutdown: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver, shutdown))
    }

    async fn run(
        self,
        mut receiver: broadcast::Receiver<String>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        if let Err(e) = self.register().await {
            warn!(error = %e, "push subscription registration failed");
        }
        info!("notification bridge started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                delivery = receiver.recv() => match delivery {
                    Ok(payload) => self.handle_push(&payload).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Deliveries were dropped; the full re-sync below
                        // covers whatever they described.
                        warn!(missed, "push channel lagged");
                        if let Err(e) = self.view_model.refresh().await {
                            warn!(error = %e, "re-sync after lag failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        info!("notification bridge stopped");
    }

    async fn handle_push(&self, payload: &str) {
        let event = match parse_push(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping undecodable push");
                return;
            }
        };
        if let Some(record_type) = &event.record_type {
            if record_type != Fruit::record_type() {
                debug!(%record_type, "ignoring push for other record type");
                return;
            }
        }

        debug!(kind = ?event.kind, id = %event.record_id, "push received");
        if event.kind == ChangeKind::Create {
            self.wait_until_visible(&event.record_id).await;
        }
        if let Err(e) = self.view_model.refresh().await {
            warn!(error = %e, "push-triggered refresh failed");
        }
    }

    /// Polls until the created record answers a query, up to the configured
    /// number of attempts. Re-syncing is still worthwhile afterwards even
    /// when the record never showed: the push might describe a change this
    /// store view cannot see.
    async fn wait_until_visible(&self, id: &RecordId) {
        for attempt in 1..=self.config.poll_attempts {
            match self.client.record_visible(Fruit::record_type(), id).await {
                Ok(true) => {
                    debug!(%id, attempt, "created record is query-visible");
                    return;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "visibility probe failed");
                    return;
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
        warn!(%id, attempts = self.config.poll_attempts, "created record never became visible");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(code: u8) -> String {
        format!(r#"{{"ck":{{"qry":{{"fo":{code},"rid":"abc-123","recordType":"Fruits"}}}}}}"#)
    }

    #[test]
    fn parses_each_operation_code() {
        for (code, kind) in [
            (1, ChangeKind::Create),
            (2, ChangeKind::Update),
            (3, ChangeKind::Delete),
        ] {
            let event = parse_push(&payload(code)).unwrap();
            assert_eq!(event.kind, kind);
            assert_eq!(event.record_id, RecordId::from("abc-123"));
            assert_eq!(event.record_type.as_deref(), Some("Fruits"));
        }
    }

    #[test]
    fn rejects_unknown_operation_codes() {
        assert!(matches!(
            parse_push(&payload(9)),
            Err(FruitError::MalformedPush(_))
        ));
    }

    #[test]
    fn rejects_payloads_without_the_nested_query_shape() {
        assert!(matches!(
            parse_push(r#"{"ck":{}}"#),
            Err(FruitError::MalformedPush(_))
        ));
        assert!(matches!(
            parse_push("not json"),
            Err(FruitError::MalformedPush(_))
        ));
    }

    #[test]
    fn tolerates_a_missing_record_type() {
        let event = parse_push(r#"{"ck":{"qry":{"fo":2,"rid":"abc"}}}"#).unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.record_type, None);
    }
}
