//! COVID-19 Data Lookup Service
//!
//! Serves a read-only dataset of daily regional COVID-19 records over a
//! line-oriented JSON protocol.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               LOOKUP SERVICE                 │
//!                        │                                              │
//!     Client request     │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!     ───────────────────┼─▶│   net    │──▶│ session  │──▶│  query   │  │
//!                        │  │ listener │   │ framing  │   │ matcher  │  │
//!                        │  └──────────┘   └────┬─────┘   └────┬─────┘  │
//!                        │                      │              │        │
//!     Client response    │                      ▼              ▼        │
//!     ◀──────────────────┼──────────────── response ◀──── RecordStore   │
//!                        │                                 (read-only)  │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │  config · observability · resilience   │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! # Startup
//!
//! Configuration is read, overridden by flags, then validated. The dataset is
//! fully loaded before the listener is bound; any failure up to that point
//! ends the process with a non-zero status.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use covid_data_service::config::{read_config, validate_config, ConfigError, ServiceConfig};
use covid_data_service::observability::{init_logging, metrics};
use covid_data_service::{Listener, QueryServer, RecordStore, ServiceError};

#[derive(Parser, Debug)]
#[command(name = "covid-data-service")]
#[command(about = "Serves COVID-19 records by region or date over TCP or Unix sockets", long_about = None)]
struct Args {
    /// Address to listen on: host:port, :port, or a socket path for unix
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Network protocol: tcp, tcp4, tcp6 or unix
    #[arg(short, long)]
    network: Option<String>,

    /// CSV dataset to serve
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.listener.endpoint = endpoint.clone();
        }
        if let Some(network) = &self.network {
            config.listener.network = network.clone();
        }
        if let Some(dataset) = &self.dataset {
            config.dataset.path = dataset.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

fn build_config(args: &Args) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn start(config: ServiceConfig) -> Result<(), ServiceError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = RecordStore::load(&config.dataset.path, config.load_options())?;
    tracing::info!(
        path = %config.dataset.path.display(),
        records = store.len(),
        "Dataset loaded"
    );

    let endpoint = config.endpoint()?;
    let listener = Listener::bind(&endpoint, config.listener.max_connections).await?;
    tracing::info!(
        network = %endpoint.transport(),
        endpoint = %endpoint,
        records = store.len(),
        "Service started"
    );

    QueryServer::new(store, config.session_settings()).run(listener).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            init_logging(args.log_level.as_deref().unwrap_or("info"));
            tracing::error!(error = %err, "Invalid configuration");
            return Err(ServiceError::from(err).into());
        }
    };

    init_logging(&config.observability.log_level);
    tracing::info!(
        network = %config.listener.network,
        endpoint = %config.listener.endpoint,
        dataset = %config.dataset.path.display(),
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if let Err(err) = start(config).await {
        tracing::error!(error = %err, "Service failed to start");
        return Err(err.into());
    }
    Ok(())
}
