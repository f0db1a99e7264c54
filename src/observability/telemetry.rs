//! The telemetry context owned by a service process.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ServiceIdentity, TelemetryConfig};
use crate::export::{spawn_exporter, ExportQueue, ExporterConfig, ExporterHandle, Resource, RetryPolicy, TelemetrySink};
use crate::instruments::ServiceInstruments;
use crate::trace::Tracer;

/// Tracer, instruments and export pipeline for one service.
///
/// Created by [`Telemetry::start`] and passed to the HTTP layer explicitly;
/// nothing is registered globally. [`Telemetry::stop`] flushes and joins
/// the exporter.
pub struct Telemetry {
    resource: Resource,
    queue: ExportQueue,
    tracer: Tracer,
    instruments: Arc<ServiceInstruments>,
    exporter: ExporterHandle,
}

impl Telemetry {
    /// Start the exporter task and build the tracer and instruments.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S: TelemetrySink>(identity: &ServiceIdentity, config: &TelemetryConfig, sink: S) -> Self {
        let resource = Resource::new(&identity.name, &identity.version);
        let (queue, rx) = ExportQueue::bounded(config.queue_capacity);

        let exporter = spawn_exporter(rx, sink, resource.clone(), exporter_config(config));
        let tracer = Tracer::new(queue.clone());
        let instruments = Arc::new(ServiceInstruments::new(
            &identity.name,
            config.histogram_buckets.iter().copied(),
            queue.clone(),
        ));

        tracing::info!(
            service = %resource.service_name,
            version = %resource.service_version,
            instance_id = %resource.instance_id,
            queue_capacity = config.queue_capacity,
            "Telemetry started"
        );

        Self {
            resource,
            queue,
            tracer,
            instruments,
            exporter,
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn instruments(&self) -> &Arc<ServiceInstruments> {
        &self.instruments
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Wait until everything recorded so far has been handed to the sink.
    pub async fn force_flush(&self) -> bool {
        self.queue.flush().await
    }

    /// Flush pending telemetry and stop the exporter.
    pub async fn stop(self) {
        if !self.queue.flush().await {
            tracing::warn!("Telemetry exporter already stopped");
        }
        self.exporter.shutdown().await;
        tracing::info!(service = %self.resource.service_name, "Telemetry stopped");
    }
}

fn exporter_config(config: &TelemetryConfig) -> ExporterConfig {
    ExporterConfig {
        batch_size: config.batch_size.max(1),
        flush_interval: Duration::from_millis(config.flush_interval_ms.max(1)),
        export_timeout: Duration::from_secs(config.export_timeout_secs.max(1)),
        retry: RetryPolicy {
            max_attempts: config.max_export_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use crate::instruments::{request_attributes, Outcome};

    #[tokio::test]
    async fn test_stop_exports_everything_recorded() {
        let sink = MemorySink::new();
        let telemetry = Telemetry::start(&ServiceIdentity::default(), &TelemetryConfig::default(), sink.clone());

        let span = telemetry.tracer().start_root("GET /users");
        let attrs = request_attributes("GET", "/users", 200, Outcome::Ok);
        telemetry
            .instruments()
            .record_request(&attrs, Duration::from_millis(3), Some(span.context()));
        drop(span);

        telemetry.stop().await;

        assert_eq!(sink.spans().len(), 1);
        assert_eq!(sink.samples().len(), 2);
        let batch = &sink.batches()[0];
        assert_eq!(batch.resource.service_name, "user-service");
    }

    #[tokio::test]
    async fn test_force_flush_keeps_running() {
        let sink = MemorySink::new();
        let telemetry = Telemetry::start(&ServiceIdentity::default(), &TelemetryConfig::default(), sink.clone());

        drop(telemetry.tracer().start_root("first"));
        assert!(telemetry.force_flush().await);
        assert_eq!(sink.spans().len(), 1);

        drop(telemetry.tracer().start_root("second"));
        telemetry.stop().await;
        assert_eq!(sink.spans().len(), 2);
    }
}
