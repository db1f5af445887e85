//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (request ceiling, metrics address)
//! - Reject networks the listener cannot serve
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;
use crate::net::SUPPORTED_NETWORKS;

/// Upper bound for `session.max_request_bytes`.
pub const MAX_REQUEST_CEILING: usize = 1024 * 1024;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !SUPPORTED_NETWORKS.contains(&config.listener.network.as_str()) {
        errors.push(ValidationError::new(
            "listener.network",
            format!(
                "unsupported network protocol: {} (expected one of {})",
                config.listener.network,
                SUPPORTED_NETWORKS.join(", ")
            ),
        ));
    }

    if config.listener.endpoint.trim().is_empty() {
        errors.push(ValidationError::new("listener.endpoint", "must not be empty"));
    }

    if config.dataset.path.as_os_str().is_empty() {
        errors.push(ValidationError::new("dataset.path", "must not be empty"));
    }

    match config.session.max_request_bytes {
        0 => errors.push(ValidationError::new(
            "session.max_request_bytes",
            "must be greater than zero",
        )),
        n if n > MAX_REQUEST_CEILING => errors.push(ValidationError::new(
            "session.max_request_bytes",
            format!("must not exceed {} bytes", MAX_REQUEST_CEILING),
        )),
        _ => {}
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address: {}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServiceConfig::default();
        config.listener.network = "udp".to_string();
        config.listener.endpoint = "  ".to_string();
        config.dataset.path = Default::default();
        config.session.max_request_bytes = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.network",
                "listener.endpoint",
                "dataset.path",
                "session.max_request_bytes",
                "observability.metrics_address",
            ]
        );
    }

    #[test]
    fn request_ceiling_is_bounded() {
        let mut config = ServiceConfig::default();
        config.session.max_request_bytes = MAX_REQUEST_CEILING + 1;
        assert_eq!(validate_config(&config).unwrap_err().len(), 1);

        config.session.max_request_bytes = MAX_REQUEST_CEILING;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "garbage".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
