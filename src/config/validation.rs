//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the camera endpoint is present and parseable
//! - Validate value ranges (timeouts > 0, addresses valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::upstream::endpoint::parse_address;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("camera address is not set (set CAMERA_URL or upstream.address)")]
    MissingUpstreamAddress,

    #[error("camera request path is not set (set REQUEST_URL or upstream.request_path)")]
    MissingRequestPath,

    #[error("camera request path '{0}' must start with '/'")]
    RelativeRequestPath(String),

    #[error("camera address '{address}' is invalid: {reason}")]
    InvalidUpstreamAddress { address: String, reason: String },

    #[error("bind address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("metrics address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("listener.max_concurrent_streams must be greater than zero")]
    ZeroConcurrentStreams,

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnvValue { name: &'static str, value: String },
}

impl ValidationError {
    /// True for the errors that mean a required value was never provided.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            ValidationError::MissingUpstreamAddress | ValidationError::MissingRequestPath
        )
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let upstream = &config.upstream;
    if upstream.address.trim().is_empty() {
        errors.push(ValidationError::MissingUpstreamAddress);
    } else if let Err(e) = parse_address(&upstream.address) {
        errors.push(ValidationError::InvalidUpstreamAddress {
            address: upstream.address.clone(),
            reason: e.to_string(),
        });
    }

    if upstream.request_path.trim().is_empty() {
        errors.push(ValidationError::MissingRequestPath);
    } else if !upstream.request_path.starts_with('/') {
        errors.push(ValidationError::RelativeRequestPath(upstream.request_path.clone()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_concurrent_streams == 0 {
        errors.push(ValidationError::ZeroConcurrentStreams);
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_ms"));
    }
    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("request_ms"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
