use record_client::memory::{MemoryStore, StoreOp};
use record_client::{
    ClientConfig, DatabaseScope, FieldValue, Query, Record, RetryPolicy, SortBy, Storable,
    StoreClient, StoreError,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Fruit {
    record: Record,
}

impl Fruit {
    fn with_name(name: &str) -> Self {
        let mut record = Record::new("Fruits");
        record.set("name", FieldValue::Text(name.into()));
        Self { record }
    }

    fn name(&self) -> &str {
        self.record.text("name").unwrap_or("")
    }
}

impl Storable for Fruit {
    fn record_type() -> &'static str {
        "Fruits"
    }

    fn from_record(record: Record) -> Result<Self, StoreError> {
        if record.text("name").is_none() {
            return Err(StoreError::Decode(format!(
                "Fruits record {} has no name",
                record.id()
            )));
        }
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }
}

fn client(store: &Arc<MemoryStore>) -> StoreClient {
    StoreClient::new(store.clone(), DatabaseScope::Private)
}

/// A client with retries disabled and a short timeout, for failure-path
/// tests that should not wait out the backoff schedule.
fn impatient_client(store: &Arc<MemoryStore>) -> StoreClient {
    StoreClient::with_config(
        store.clone(),
        DatabaseScope::Private,
        ClientConfig {
            request_timeout: Duration::from_millis(20),
            retry: RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
        },
    )
}

fn sorted_query() -> Query {
    Query::new("Fruits").sort(SortBy::ascending("name"))
}

async fn seed(client: &StoreClient, names: &[&str]) {
    for name in names {
        client.create(&Fruit::with_name(name)).await.unwrap();
    }
}

/// For every page limit smaller than the result count, retrieve returns the
/// complete sorted result with no duplicates and no gaps.
#[tokio::test]
async fn retrieve_follows_cursors_for_every_page_limit() {
    let store = Arc::new(MemoryStore::new());
    let client = client(&store);
    let names = ["Fig", "Apple", "Date", "Banana", "Grape", "Cherry", "Kiwi"];
    seed(&client, &names).await;

    let mut expected: Vec<&str> = names.to_vec();
    expected.sort_unstable();

    for limit in 1..=names.len() {
        let fruits: Vec<Fruit> = client
            .retrieve(sorted_query().page_limit(limit))
            .await
            .unwrap();
        let got: Vec<&str> = fruits.iter().map(Fruit::name).collect();
        assert_eq!(got, expected, "page limit {limit}");
    }
}

/// A server-side page cap must not truncate results either.
#[tokio::test]
async fn retrieve_is_complete_under_server_page_cap() {
    let store = Arc::new(MemoryStore::new().with_max_page_size(2));
    let client = client(&store);
    seed(&client, &["Cherry", "Apple", "Banana", "Elderberry", "Date"]).await;

    let fruits: Vec<Fruit> = client.retrieve(sorted_query()).await.unwrap();
    let got: Vec<&str> = fruits.iter().map(Fruit::name).collect();
    assert_eq!(got, ["Apple", "Banana", "Cherry", "Date", "Elderberry"]);
}

#[tokio::test]
async fn retrieve_retries_transient_page_failures() {
    let store = Arc::new(MemoryStore::new());
    let client = client(&store);
    seed(&client, &["Apple", "Banana"]).await;

    store.inject_failure(StoreOp::Query, StoreError::Transport("flaky".into()));

    let fruits: Vec<Fruit> = client.retrieve(sorted_query()).await.unwrap();
    assert_eq!(fruits.len(), 2);
}

#[tokio::test]
async fn retrieve_fails_once_retries_are_exhausted() {
    let store = Arc::new(MemoryStore::new());
    let client = client(&store);
    seed(&client, &["Apple"]).await;

    for _ in 0..3 {
        store.inject_failure(StoreOp::Query, StoreError::Transport("down".into()));
    }

    let result: Result<Vec<Fruit>, _> = client.retrieve(sorted_query()).await;
    assert!(matches!(result, Err(StoreError::Transport(_))));
}

/// A failure on a later page fails the whole call; no partial result leaks.
#[tokio::test]
async fn retrieve_discards_partial_results_on_page_failure() {
    let store = Arc::new(MemoryStore::new());
    seed(&client(&store), &["Apple", "Banana", "Cherry", "Date", "Elderberry"]).await;

    store.inject_pass(StoreOp::Query);
    store.inject_failure(StoreOp::Query, StoreError::Transport("mid-query outage".into()));

    let impatient = impatient_client(&store);
    let result: Result<Vec<Fruit>, _> = impatient.retrieve(sorted_query().page_limit(2)).await;
    assert!(matches!(result, Err(StoreError::Transport(_))));
}

#[tokio::test]
async fn retrieve_fails_to_decode_malformed_records() {
    use record_client::RecordStore;

    let store = Arc::new(MemoryStore::new());
    let client = client(&store);
    seed(&client, &["Apple"]).await;

    // A row of the right type but with no name field.
    let malformed = Record::new("Fruits");
    store
        .save(DatabaseScope::Private, malformed)
        .await
        .unwrap();

    let result: Result<Vec<Fruit>, _> = client.retrieve(sorted_query()).await;
    assert!(matches!(result, Err(StoreError::Decode(_))));
}

#[tokio::test]
async fn stale_change_tag_surfaces_as_conflict() {
    let store = Arc::new(MemoryStore::new());
    let client = client(&store);

    let fruit = Fruit::with_name("Apple");
    let saved = client.create(&fruit).await.unwrap();

    // Writer one updates from the saved record and wins.
    let mut winner = Fruit { record: saved.clone() };
    winner.record.set("name", FieldValue::Text("Apple!".into()));
    client.update(&winner).await.unwrap();

    // Writer two still holds the original tag and must not overwrite.
    let mut loser = Fruit { record: saved };
    loser.record.set("name", FieldValue::Text("Apricot".into()));
    let result = client.update(&loser).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn delete_is_idempotent_from_the_caller_view() {
    let store = Arc::new(MemoryStore::new());
    let client = client(&store);

    let fruit = Fruit::with_name("Apple");
    client.create(&fruit).await.unwrap();
    client.delete(&fruit).await.unwrap();
    // Second delete hits an absent record and still succeeds.
    client.delete(&fruit).await.unwrap();

    let fruits: Vec<Fruit> = client.retrieve(sorted_query()).await.unwrap();
    assert!(fruits.is_empty());
}

#[tokio::test]
async fn slow_store_round_trips_classify_as_transport() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(100)));
    let impatient = impatient_client(&store);

    let result = impatient.account_status().await;
    assert!(matches!(result, Err(StoreError::Transport(_))));
}

#[tokio::test]
async fn missing_identity_components_report_not_found() {
    let store = Arc::new(MemoryStore::new());
    let client = client(&store);

    let result = client.user_identity().await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));

    let named = Arc::new(MemoryStore::new().with_identity("R. Mark Volkmann"));
    let client = StoreClient::new(named, DatabaseScope::Private);
    assert_eq!(client.user_identity().await.unwrap(), "R. Mark Volkmann");
}

#[tokio::test]
async fn status_text_matches_account_status() {
    use record_client::AccountStatus;

    let store = Arc::new(MemoryStore::new().with_account_status(AccountStatus::NoAccount));
    let client = client(&store);
    assert_eq!(client.status_text().await.unwrap(), "no account");
}
