//! # Queries and Cursors
//!
//! Query DTOs for paged retrieval. A backend answers one page at a time;
//! when more results exist it returns an opaque [`Cursor`] that the caller
//! feeds into the next round trip. The cursor lives for a single retrieval
//! call chain and is never persisted.

use crate::record::{FieldValue, Record, RecordId};
use serde::{Deserialize, Serialize};

/// Filter applied server-side to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Match every record of the queried type.
    All,
    /// Match the single record with this identifier.
    Id(RecordId),
    /// Match records whose field equals the given value.
    Field { name: String, value: FieldValue },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Server-side sort key for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// A query over one record type.
///
/// `page_limit` bounds a single round trip, not the overall result; the
/// client keeps following cursors until the store reports no more pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub record_type: String,
    pub filter: Filter,
    pub sort: Option<SortBy>,
    pub page_limit: Option<usize>,
}

impl Query {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            filter: Filter::All,
            sort: None,
            page_limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: SortBy) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }
}

/// Opaque continuation token returned by a paged query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(pub(crate) String);

/// One page of query results, with the cursor for the next page when more
/// results exist.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub records: Vec<Record>,
    pub cursor: Option<Cursor>,
}
