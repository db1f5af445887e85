//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! listener, sessions, server
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log lines
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Every log line about a connection carries its `connection_id`
//! - Metrics are cheap facade calls; nothing is recorded until an exporter
//!   is installed

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
