//! Cross-service trace propagation with exemplar-linked metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client / upstream service
//!        │  traceparent
//!        ▼
//!  ┌───────────────────────────────────────────────────────────────┐
//!  │ http::server (request id, timeout, transport tracing)         │
//!  │    └─ http::scope ── propagation::extract ── trace::Tracer    │
//!  │          │                                                    │
//!  │          ├─ handlers ── store::RecordStore                    │
//!  │          │      └────── client::TracedClient ──▶ downstream   │
//!  │          │                  (propagation::inject)             │
//!  │          ├─ instruments (counts, durations, exemplars)        │
//!  │          └─ propagation::inject into the response             │
//!  │                                                               │
//!  │ ended spans + metric samples                                  │
//!  │    └─ export::ExportQueue ─▶ BatchExporter ─▶ TelemetrySink   │
//!  └───────────────────────────────────────────────────────────────┘
//! ```

// Trace model
pub mod propagation;
pub mod trace;
pub mod instruments;
pub mod export;

// Services
pub mod client;
pub mod http;
pub mod store;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;
