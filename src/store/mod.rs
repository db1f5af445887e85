//! In-memory record store.
//!
//! # Data Flow
//! ```text
//! dataset file
//!     → loader.rs (split rows, map columns)
//!     → Vec<Record>
//!     → RecordStore::new (precompute match keys, freeze)
//!     → shared via Arc to every session
//! ```
//!
//! # Design Decisions
//! - Built once before the listener is bound; there is no mutation API
//! - Cloning a store clones an `Arc`, never the records
//! - Uppercase forms of `region` and `date` are computed once at build time

pub mod loader;
pub mod record;

use std::sync::Arc;

pub use loader::{load_records, LoadError, LoadOptions};
pub use record::Record;

/// Uppercased matching keys for one record.
#[derive(Debug)]
pub(crate) struct MatchKeys {
    pub(crate) region: String,
    pub(crate) date: String,
}

#[derive(Debug)]
struct StoreInner {
    records: Vec<Record>,
    keys: Vec<MatchKeys>,
}

/// Immutable, shareable collection of records in file order.
#[derive(Debug, Clone)]
pub struct RecordStore {
    inner: Arc<StoreInner>,
}

impl RecordStore {
    /// Freeze `records` into a store.
    pub fn new(records: Vec<Record>) -> Self {
        let keys = records
            .iter()
            .map(|record| MatchKeys {
                region: record.region.to_uppercase(),
                date: record.date.to_uppercase(),
            })
            .collect();

        Self {
            inner: Arc::new(StoreInner { records, keys }),
        }
    }

    /// Load the dataset at `path` and freeze it.
    pub fn load(path: &std::path::Path, options: LoadOptions) -> Result<Self, LoadError> {
        load_records(path, options).map(Self::new)
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.inner.records
    }

    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.records.is_empty()
    }

    /// Records paired with their match keys.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Record, &MatchKeys)> {
        self.inner.records.iter().zip(self.inner.keys.iter())
    }
}
