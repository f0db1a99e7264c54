//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, ServiceKind};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read and deserialize a TOML file without semantic checks.
pub fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub kind: Option<ServiceKind>,
    pub bind_address: Option<String>,
    pub post_service_url: Option<String>,
}

impl ConfigOverrides {
    /// A kind switch resets kind-dependent defaults before the explicit
    /// address overrides are applied.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(kind) = self.kind {
            if kind != config.service.kind {
                config.apply_kind(kind);
            }
        }
        if let Some(bind) = &self.bind_address {
            config.listener.bind_address = bind.clone();
        }
        if let Some(url) = &self.post_service_url {
            config.downstream.post_service_url = Some(url.clone());
        }
    }
}

/// Read the file (or defaults), apply overrides, then validate once.
pub fn resolve_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_values_are_reported_together() {
        let err = parse_config(
            r#"
            [timeouts]
            request_secs = 0
            downstream_secs = 0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("tracelink-{}-{name}.toml", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_bind_override_repairs_invalid_file_value() {
        let path = write_temp("bad-bind", "[listener]\nbind_address = \"nowhere\"\n");

        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));

        let overrides = ConfigOverrides {
            bind_address: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        };
        let config = resolve_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_overrides_are_validated() {
        let overrides = ConfigOverrides {
            bind_address: Some("nowhere".to_string()),
            ..Default::default()
        };
        let err = resolve_config(None, &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(errors) if errors.len() == 1));
    }

    #[test]
    fn test_kind_override_resets_defaults_before_bind() {
        let overrides = ConfigOverrides {
            kind: Some(ServiceKind::Post),
            bind_address: Some("127.0.0.1:7000".to_string()),
            post_service_url: None,
        };
        let config = resolve_config(None, &overrides).unwrap();
        assert_eq!(config.service.kind, ServiceKind::Post);
        assert_eq!(config.service.name, "post-service");
        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        assert!(matches!(parse_config("[service"), Err(ConfigError::Parse(_))));
    }
}
