//! # Records
//!
//! A [`Record`] is one opaque row in the remote store: a store-assigned
//! stable identifier, an immutable record-type tag (e.g. `"Fruits"`), and a
//! dynamically typed field map. Entities project typed views over exactly
//! one record; the client never looks inside the field map itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a record, assigned when the record is constructed
/// and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// A dynamically typed field value, constrained to the subset the backend
/// accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl FieldValue {
    /// Returns the contained text, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One opaque row in the remote store.
///
/// The identifier is pre-assigned at construction (the backend keeps it on
/// first save), and the record type is fixed for the life of the record.
/// The change tag is `None` until the store has accepted a save; afterwards
/// every successful save returns the record with a fresh tag, and a save
/// carrying a stale tag fails with [`StoreError::Conflict`](crate::StoreError::Conflict).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    record_type: String,
    change_tag: Option<u64>,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates a fresh, unsaved record of the given type.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            id: RecordId(Uuid::new_v4().to_string()),
            record_type: record_type.into(),
            change_tag: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// The tag of the last accepted save, or `None` for an unsaved record.
    pub fn change_tag(&self) -> Option<u64> {
        self.change_tag
    }

    pub(crate) fn set_change_tag(&mut self, tag: u64) {
        self.change_tag = Some(tag);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Convenience accessor for text fields.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_has_id_and_no_change_tag() {
        let record = Record::new("Fruits");
        assert!(!record.id().as_str().is_empty());
        assert_eq!(record.record_type(), "Fruits");
        assert_eq!(record.change_tag(), None);
    }

    #[test]
    fn text_accessor_ignores_non_text_fields() {
        let mut record = Record::new("Fruits");
        record.set("name", FieldValue::Text("Apple".into()));
        record.set("count", FieldValue::Integer(3));

        assert_eq!(record.text("name"), Some("Apple"));
        assert_eq!(record.text("count"), None);
        assert_eq!(record.text("missing"), None);
    }

    #[test]
    fn set_overwrites_existing_field() {
        let mut record = Record::new("Fruits");
        record.set("name", FieldValue::Text("Apple".into()));
        record.set("name", FieldValue::Text("Apple!".into()));
        assert_eq!(record.text("name"), Some("Apple!"));
    }
}
