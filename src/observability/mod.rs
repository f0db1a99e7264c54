//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → tracing spans and events (logging.rs, via tracing-subscriber)
//!     → exported spans and metric samples (telemetry.rs → export queue)
//!     → pipeline self-metrics (metrics.rs, via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Telemetry sink (HTTP ingestion endpoint or log)
//!     → Metrics endpoints (Prometheus scrape, OpenMetrics /metrics)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace id is recorded on the request's log span for correlation
//! - The telemetry context is created at startup and passed explicitly

pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use telemetry::Telemetry;
