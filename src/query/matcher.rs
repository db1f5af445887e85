//! Record matching.
//!
//! # Responsibilities
//! - Select records whose `region` or `date` equals a filter token
//!
//! # Design Decisions
//! - Comparison is exact after uppercasing both sides; no prefix, substring
//!   or partial-date matching
//! - Empty filter and `*` select every record
//! - Results borrow from the store and keep store order

use crate::store::{Record, RecordStore};

/// Filter token that selects every record.
pub const WILDCARD: &str = "*";

/// Return the records matching `filter`, in store order.
pub fn find<'s>(store: &'s RecordStore, filter: &str) -> Vec<&'s Record> {
    if filter.is_empty() || filter == WILDCARD {
        return store.records().iter().collect();
    }

    let filter = filter.to_uppercase();
    store
        .entries()
        .filter(|(_, keys)| keys.region == filter || keys.date == filter)
        .map(|(record, _)| record)
        .collect()
}
