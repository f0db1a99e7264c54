//! Telemetry export pipeline.
//!
//! # Data Flow
//! ```text
//! Request path (never blocks):
//!     ActiveSpan::end()          → queue.rs push_span   (try_send)
//!     Counter/Histogram records  → queue.rs push_sample (try_send)
//!
//! Background task (exporter.rs):
//!     bounded mpsc receiver
//!     → buffer until batch_size or flush interval
//!     → batch.rs ExportBatch {resource, spans, samples}
//!     → sink.rs TelemetrySink::export (retry.rs backoff on failure)
//! ```
//!
//! # Design Decisions
//! - Bounded queue; when full the newest item is dropped and counted
//! - Flush requests travel through the same queue, so a flush observes
//!   everything enqueued before it
//! - Sinks are pluggable: HTTP ingestion, log, in-memory

pub mod batch;
pub mod exporter;
pub mod queue;
pub mod retry;
pub mod sink;

pub use batch::{ExportBatch, Resource};
pub use exporter::{spawn_exporter, ExporterConfig, ExporterHandle};
pub use queue::{ExportQueue, TelemetryItem};
pub use retry::RetryPolicy;
pub use sink::{ConfiguredSink, HttpSink, LogSink, MemorySink, SinkError, TelemetrySink};
