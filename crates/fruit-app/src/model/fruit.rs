use record_client::{FieldValue, Record, Storable, StoreError};

/// A fruit in the shared list.
///
/// A typed projection over exactly one [`Record`]: the entity owns its
/// backing record and reads `name` through to the record's `"name"` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Fruit {
    record: Record,
}

impl Fruit {
    /// Creates a fruit backed by a fresh, unsaved record.
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut record = Record::new(Self::record_type());
        record.set("name", FieldValue::Text(name.into()));
        Self { record }
    }

    pub fn name(&self) -> &str {
        self.record.text("name").unwrap_or("")
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.record.set("name", FieldValue::Text(name.into()));
    }

    /// Replaces the backing record, e.g. with the stored copy returned by a
    /// save (which carries the fresh change tag).
    pub(crate) fn set_record(&mut self, record: Record) {
        self.record = record;
    }
}

impl Storable for Fruit {
    fn record_type() -> &'static str {
        "Fruits"
    }

    fn from_record(record: Record) -> Result<Self, StoreError> {
        if record.text("name").is_none() {
            return Err(StoreError::Decode(format!(
                "Fruits record {} has no name field",
                record.id()
            )));
        }
        Ok(Self { record })
    }

    fn record(&self) -> &Record {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_name_sets_the_name_field() {
        let fruit = Fruit::with_name("Apple");
        assert_eq!(fruit.name(), "Apple");
        assert_eq!(fruit.record().record_type(), "Fruits");
    }

    #[test]
    fn decode_requires_a_name_field() {
        let record = Record::new("Fruits");
        assert!(matches!(
            Fruit::from_record(record),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_a_non_text_name() {
        let mut record = Record::new("Fruits");
        record.set("name", FieldValue::Integer(7));
        assert!(matches!(
            Fruit::from_record(record),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn decode_round_trips_a_valid_record() {
        let original = Fruit::with_name("Cherry");
        let decoded = Fruit::from_record(original.record().clone()).unwrap();
        assert_eq!(decoded, original);
    }
}
