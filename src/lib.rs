//! COVID-19 dataset lookup service.
//!
//! Loads a read-only table of daily regional records at startup and answers
//! JSON queries over persistent TCP or Unix-socket connections.

pub mod config;
pub mod error;
pub mod net;
pub mod observability;
pub mod query;
pub mod resilience;
pub mod server;
pub mod session;
pub mod store;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use net::{Endpoint, Listener};
pub use server::QueryServer;
pub use session::{Session, SessionSettings};
pub use store::{Record, RecordStore};
