//! # Storable Trait
//!
//! The [`Storable`] trait is the contract between typed domain entities and
//! the generic [`StoreClient`](crate::StoreClient). An entity is a typed
//! projection over exactly one [`Record`]: it is constructed by decoding a
//! record returned from the store, and it exposes its backing record so the
//! client can save or delete it without knowing the concrete type.
//!
//! Decoding is fallible. A record that is missing required fields, or whose
//! fields have the wrong type, yields [`StoreError::Decode`] instead of a
//! panic, so malformed rows coming back from a query surface as errors the
//! caller can handle.

use crate::error::StoreError;
use crate::record::Record;

/// Contract for entity types the generic client can manage.
pub trait Storable: Clone + Send + Sync + Sized + 'static {
    /// The record-type tag this entity is stored under (e.g. `"Fruits"`).
    fn record_type() -> &'static str;

    /// Decodes an entity from a record returned by the store.
    ///
    /// Implementations must validate required fields and fail with
    /// [`StoreError::Decode`] rather than panicking on malformed data.
    fn from_record(record: Record) -> Result<Self, StoreError>;

    /// The backing record, saved verbatim on create/update.
    fn record(&self) -> &Record;
}
