//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! accept() fails
//!     → backoff.rs (exponential delay with jitter, capped)
//!     → accept again; a success resets the delay
//! ```
//!
//! # Design Decisions
//! - The accept loop never gives up; it only slows down
//! - Session I/O failures are not retried; the session just ends

pub mod backoff;

pub use backoff::{calculate_backoff, AcceptBackoff};
