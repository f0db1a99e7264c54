//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (service kind, bind address, downstream URL)
//!     → validation.rs (semantic checks, once)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc with the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, resolve_config, ConfigError, ConfigOverrides};
pub use schema::{
    DownstreamConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig, ServiceIdentity,
    ServiceKind, TelemetryConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
