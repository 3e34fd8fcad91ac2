//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the image feed gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// gRPC listener configuration.
    pub listener: ListenerConfig,

    /// The camera this gateway fronts.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "[::]:8061").
    pub bind_address: String,

    /// Maximum concurrent HTTP/2 streams per client connection.
    pub max_concurrent_streams: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "[::]:8061".to_string(),
            max_concurrent_streams: 16,
        }
    }
}

/// Camera endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Camera address: `host`, `host:port` or `http://host[:port]`.
    pub address: String,

    /// Snapshot path requested on every call (e.g., "/snapshot.jpg").
    pub request_path: String,

    /// Basic auth user. Only sent together with a non-empty password.
    pub username: Option<String>,

    /// Basic auth password. Only sent together with a non-empty user.
    pub password: Option<String>,
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Whole-call deadline (connect, request and body) in milliseconds.
    pub request_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            request_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            address = "camera.local:80"
            request_path = "/snapshot.jpg"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.address, "camera.local:80");
        assert_eq!(config.upstream.request_path, "/snapshot.jpg");
        assert_eq!(config.upstream.username, None);
        assert_eq!(config.listener.bind_address, "[::]:8061");
        assert_eq!(config.timeouts.request_ms, 10_000);
    }

    #[test]
    fn parses_json_log_format() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }
}
