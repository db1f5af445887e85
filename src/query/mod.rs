//! Query subsystem.
//!
//! # Data Flow
//! ```text
//! request bytes
//!     → request.rs (JSON → Query, date-over-region priority)
//!     → matcher.rs (Query.filter → matching records)
//! ```

pub mod matcher;
pub mod request;

pub use matcher::{find, WILDCARD};
pub use request::{FilterSource, InvalidRequest, Query};
