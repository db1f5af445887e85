//! Startup errors.
//!
//! Anything that goes wrong before the listener starts accepting is fatal.
//! Failures inside a session never reach this type; they end that session only.

use thiserror::Error;

use crate::config::ConfigError;
use crate::net::{ListenerError, UnsupportedTransport};
use crate::store::LoadError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("dataset error: {0}")]
    Dataset(#[from] LoadError),

    #[error(transparent)]
    UnsupportedTransport(#[from] UnsupportedTransport),

    #[error("listener error: {0}")]
    Bind(#[from] ListenerError),
}
