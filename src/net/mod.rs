//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! network name + endpoint string
//!     → transport.rs (validate network, normalize endpoint)
//!     → listener.rs (bind, accept, optional connection cap)
//!     → connection.rs (connection id, open-session tracking)
//!     → hand off to session layer
//! ```
//!
//! # Design Decisions
//! - TCP and Unix streams are unified behind one stream type, so the
//!   session code is written once
//! - Unsupported networks fail before any socket is created

pub mod connection;
pub mod listener;
pub mod transport;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Accepted, ConnectionStream, Listener, ListenerError, SocketName};
pub use transport::{Endpoint, Transport, UnsupportedTransport, SUPPORTED_NETWORKS};
