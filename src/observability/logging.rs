//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber once per process
//! - Pick the log level from `RUST_LOG`, falling back to configuration
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level so operators can raise
//!   verbosity without editing files
//! - Initialization is idempotent; a second call is a no-op

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by the subscriber.
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!("covid_data_service={default_level}"))
            .unwrap_or_else(|_| EnvFilter::new("covid_data_service=info"))
    })
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(build_filter(default_level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _ = init_logging("debug");
        assert!(!init_logging("info"));
    }

    #[test]
    fn bad_level_falls_back() {
        let filter = build_filter("not a level!!");
        assert!(!filter.to_string().is_empty());
    }
}
