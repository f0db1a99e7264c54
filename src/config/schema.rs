//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::instruments::DEFAULT_BUCKETS;

/// Root configuration for one service process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service identity, attached to every exported batch.
    pub service: ServiceIdentity,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Addresses of services this one calls.
    pub downstream: DownstreamConfig,

    /// Telemetry pipeline settings.
    pub telemetry: TelemetryConfig,

    /// Logging and self-metrics settings.
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Defaults for the given service kind.
    pub fn for_kind(kind: ServiceKind) -> Self {
        let mut config = Self::default();
        config.apply_kind(kind);
        config
    }

    /// Switch identity and default port to `kind`.
    pub fn apply_kind(&mut self, kind: ServiceKind) {
        self.service.kind = kind;
        self.service.name = kind.default_name().to_string();
        self.listener.bind_address = kind.default_bind_address().to_string();
        if kind == ServiceKind::Post {
            self.observability.metrics_address = "0.0.0.0:9091".to_string();
        }
    }
}

/// Which set of endpoints the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    #[default]
    User,
    Post,
}

impl ServiceKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            ServiceKind::User => "user-service",
            ServiceKind::Post => "post-service",
        }
    }

    pub fn default_bind_address(&self) -> &'static str {
        match self {
            ServiceKind::User => "0.0.0.0:8080",
            ServiceKind::Post => "0.0.0.0:8081",
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceIdentity {
    /// `service.name` resource attribute and metric prefix.
    pub name: String,

    /// `service.version` resource attribute.
    pub version: String,

    pub kind: ServiceKind,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            name: ServiceKind::User.default_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            kind: ServiceKind::User,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: ServiceKind::User.default_bind_address().to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for calls to downstream services in seconds.
    pub downstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            downstream_secs: 10,
        }
    }
}

/// Downstream service addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the post service, used by the chained user endpoint.
    pub post_service_url: Option<String>,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            post_service_url: Some("http://127.0.0.1:8081".to_string()),
        }
    }
}

/// Telemetry pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Ingestion endpoint for exported batches. Batches are logged when unset.
    pub endpoint: Option<String>,

    /// Maximum pending spans and samples before new ones are dropped.
    pub queue_capacity: usize,

    /// Items per export batch.
    pub batch_size: usize,

    /// Maximum time an item waits before being exported.
    pub flush_interval_ms: u64,

    /// Upper bound for one export call in seconds.
    pub export_timeout_secs: u64,

    /// Attempts per batch before it is dropped.
    pub max_export_attempts: u32,

    pub retry_base_delay_ms: u64,

    pub retry_max_delay_ms: u64,

    /// Upper bounds for the request duration histogram, in seconds.
    pub histogram_buckets: Vec<f64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            queue_capacity: 2048,
            batch_size: 256,
            flush_interval_ms: 5000,
            export_timeout_secs: 10,
            max_export_attempts: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 2000,
            histogram_buckets: DEFAULT_BUCKETS.to_vec(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
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
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint for pipeline self-metrics.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.service.kind, ServiceKind::User);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.telemetry.queue_capacity, 2048);
        assert!(config.telemetry.endpoint.is_none());
        assert_eq!(config.telemetry.histogram_buckets.len(), DEFAULT_BUCKETS.len());
    }

    #[test]
    fn test_partial_sections_override() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [service]
            name = "post-service"
            kind = "post"

            [telemetry]
            endpoint = "http://collector:4318/v1/telemetry"
            batch_size = 64

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.kind, ServiceKind::Post);
        assert_eq!(config.telemetry.batch_size, 64);
        assert_eq!(config.telemetry.queue_capacity, 2048);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_for_kind_post() {
        let config = ServiceConfig::for_kind(ServiceKind::Post);
        assert_eq!(config.service.name, "post-service");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
    }
}
