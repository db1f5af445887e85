//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::{Endpoint, UnsupportedTransport};
use crate::session::{SessionSettings, DEFAULT_MAX_REQUEST_BYTES};
use crate::store::LoadOptions;

/// Root configuration for the lookup service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (network, endpoint, limits).
    pub listener: ListenerConfig,

    /// Dataset file settings.
    pub dataset: DatasetConfig,

    /// Per-connection session settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Build the endpoint the listener binds to.
    pub fn endpoint(&self) -> Result<Endpoint, UnsupportedTransport> {
        Endpoint::new(&self.listener.network, &self.listener.endpoint)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_request_bytes: self.session.max_request_bytes,
            idle_timeout: match self.session.idle_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            has_header: self.dataset.has_header,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Transport name: tcp, tcp4, tcp6 or unix.
    pub network: String,

    /// `host:port`, `:port`, or a socket path for unix.
    pub endpoint: String,

    /// Maximum concurrent connections (0 = unlimited).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            network: "tcp".to_string(),
            endpoint: ":4040".to_string(),
            max_connections: 0,
        }
    }
}

/// Dataset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the CSV file loaded at startup.
    pub path: PathBuf,

    /// Skip the first row.
    pub has_header: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("covid_data.csv"),
            has_header: false,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest accepted request line, in bytes.
    pub max_request_bytes: usize,

    /// Close a session after this many idle seconds (0 = never).
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            idle_timeout_secs: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
