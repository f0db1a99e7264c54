//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0, batch fits queue, buckets ascending)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ServiceConfig, ServiceKind};

/// A single semantic problem with a configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.downstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.downstream_secs", "must be greater than 0"));
    }

    match (&config.downstream.post_service_url, config.service.kind) {
        (Some(url), _) => {
            if Url::parse(url).is_err() {
                errors.push(ValidationError::new(
                    "downstream.post_service_url",
                    format!("'{url}' is not a valid URL"),
                ));
            }
        }
        (None, ServiceKind::User) => {
            errors.push(ValidationError::new(
                "downstream.post_service_url",
                "required for the user service",
            ));
        }
        (None, ServiceKind::Post) => {}
    }

    let telemetry = &config.telemetry;
    if telemetry.queue_capacity == 0 {
        errors.push(ValidationError::new("telemetry.queue_capacity", "must be greater than 0"));
    }
    if telemetry.batch_size == 0 {
        errors.push(ValidationError::new("telemetry.batch_size", "must be greater than 0"));
    } else if telemetry.batch_size > telemetry.queue_capacity {
        errors.push(ValidationError::new(
            "telemetry.batch_size",
            "must not exceed telemetry.queue_capacity",
        ));
    }
    if telemetry.flush_interval_ms == 0 {
        errors.push(ValidationError::new("telemetry.flush_interval_ms", "must be greater than 0"));
    }
    if telemetry.export_timeout_secs == 0 {
        errors.push(ValidationError::new("telemetry.export_timeout_secs", "must be greater than 0"));
    }
    if telemetry.max_export_attempts == 0 {
        errors.push(ValidationError::new("telemetry.max_export_attempts", "must be at least 1"));
    }
    if telemetry.retry_base_delay_ms > telemetry.retry_max_delay_ms {
        errors.push(ValidationError::new(
            "telemetry.retry_base_delay_ms",
            "must not exceed telemetry.retry_max_delay_ms",
        ));
    }
    if let Some(endpoint) = &telemetry.endpoint {
        if Url::parse(endpoint).is_err() {
            errors.push(ValidationError::new(
                "telemetry.endpoint",
                format!("'{endpoint}' is not a valid URL"),
            ));
        }
    }

    let buckets = &telemetry.histogram_buckets;
    if buckets.is_empty() {
        errors.push(ValidationError::new("telemetry.histogram_buckets", "must not be empty"));
    } else if buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
        errors.push(ValidationError::new(
            "telemetry.histogram_buckets",
            "bounds must be finite and positive",
        ));
    } else if buckets.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(ValidationError::new(
            "telemetry.histogram_buckets",
            "bounds must be strictly ascending",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
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
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
        assert_eq!(validate_config(&ServiceConfig::for_kind(ServiceKind::Post)), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "nowhere".to_string();
        config.timeouts.request_secs = 0;
        config.telemetry.batch_size = 10_000;
        config.telemetry.histogram_buckets = vec![1.0, 0.5];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.request_secs",
                "telemetry.batch_size",
                "telemetry.histogram_buckets",
            ]
        );
    }

    #[test]
    fn test_user_service_requires_post_service_url() {
        let mut config = ServiceConfig::default();
        config.downstream.post_service_url = None;
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::for_kind(ServiceKind::Post);
        config.downstream.post_service_url = None;
        assert!(validate_config(&config).is_ok());
    }
}
