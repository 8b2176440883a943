//! # Record Client
//!
//! This crate provides the building blocks for talking to a managed cloud
//! record store: an opaque record model, a typed-entity capability trait, a
//! backend contract, and a CRUD/query client that hides pagination,
//! retries, and timeouts from callers.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Data Layer** ([`Record`], [`Storable`]) - opaque rows and the typed
//!    projections applications define over them
//! 2. **Backend Layer** ([`RecordStore`]) - the asynchronous contract a
//!    concrete store implements; [`MemoryStore`](memory::MemoryStore) is the
//!    deterministic implementation used by demos and tests
//! 3. **Client Layer** ([`StoreClient`]) - the operations applications call:
//!    account status, permission prompt, identity lookup, CRUD, cursor-paged
//!    retrieval, and subscription registration
//!
//! This separation means an application written against [`StoreClient`]
//! runs unchanged against any backend that implements [`RecordStore`].
//!
//! ## Core Abstractions
//!
//! ### [`Storable`] - Typed Entities
//!
//! An entity owns exactly one backing [`Record`] and decodes fallibly:
//!
//! ```rust
//! use record_client::{FieldValue, Record, Storable, StoreError};
//!
//! #[derive(Clone)]
//! struct Fruit {
//!     record: Record,
//! }
//!
//! impl Storable for Fruit {
//!     fn record_type() -> &'static str {
//!         "Fruits"
//!     }
//!
//!     fn from_record(record: Record) -> Result<Self, StoreError> {
//!         if record.text("name").is_none() {
//!             return Err(StoreError::Decode("Fruits record without name".into()));
//!         }
//!         Ok(Self { record })
//!     }
//!
//!     fn record(&self) -> &Record {
//!         &self.record
//!     }
//! }
//! ```
//!
//! ### [`StoreClient`] - The Operations
//!
//! ```rust
//! # use record_client::{FieldValue, Record, Storable, StoreError};
//! # #[derive(Clone)]
//! # struct Fruit { record: Record }
//! # impl Storable for Fruit {
//! #     fn record_type() -> &'static str { "Fruits" }
//! #     fn from_record(record: Record) -> Result<Self, StoreError> { Ok(Self { record }) }
//! #     fn record(&self) -> &Record { &self.record }
//! # }
//! use record_client::memory::MemoryStore;
//! use record_client::{DatabaseScope, Query, SortBy, StoreClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), record_client::StoreError> {
//!     let store = Arc::new(MemoryStore::new());
//!     let client = StoreClient::new(store, DatabaseScope::Private);
//!
//!     let mut record = Record::new("Fruits");
//!     record.set("name", FieldValue::Text("Apple".into()));
//!     let fruit = Fruit { record };
//!     client.create(&fruit).await?;
//!
//!     let query = Query::new("Fruits").sort(SortBy::ascending("name"));
//!     let fruits: Vec<Fruit> = client.retrieve(query).await?;
//!     assert_eq!(fruits.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Pagination
//!
//! A paged query answers one bounded round trip at a time, returning a
//! [`Cursor`] while more results exist. [`StoreClient::retrieve`] loops
//! until the cursor is exhausted, so callers always see the complete result
//! set regardless of page limits.

pub mod client;
pub mod entity;
pub mod error;
pub mod memory;
pub mod query;
pub mod record;
pub mod store;
pub mod tracing;

// Re-export core types for convenience
pub use client::{ClientConfig, RetryPolicy, StoreClient};
pub use entity::Storable;
pub use error::StoreError;
pub use query::{Cursor, Filter, Query, QueryPage, SortBy, SortDirection};
pub use record::{FieldValue, Record, RecordId};
pub use store::{
    AccountStatus, Capability, ChangeKind, DatabaseScope, PermissionState, RecordStore,
    Subscription,
};
