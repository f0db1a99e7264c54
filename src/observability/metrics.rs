//! Self-metrics of the telemetry pipeline.
//!
//! # Responsibilities
//! - Install the Prometheus recorder and its scrape listener
//! - Count exported, dropped and failed telemetry
//!
//! # Metrics
//! - `telemetry_items_dropped_total` (counter): by `kind` and `reason`
//! - `telemetry_spans_exported_total` (counter)
//! - `telemetry_samples_exported_total` (counter)
//! - `telemetry_export_failures_total` (counter): batches dropped after retries
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op, which keeps tests free of global state

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_item_dropped(kind: &'static str, reason: &'static str) {
    metrics::counter!("telemetry_items_dropped_total", "kind" => kind, "reason" => reason).increment(1);
}

pub fn record_batch_exported(spans: usize, samples: usize) {
    metrics::counter!("telemetry_spans_exported_total").increment(spans as u64);
    metrics::counter!("telemetry_samples_exported_total").increment(samples as u64);
}

pub fn record_export_failure() {
    metrics::counter!("telemetry_export_failures_total").increment(1);
}
