//! Telemetry sinks.
//!
//! A sink receives whole batches from the exporter task. Delivery is
//! best-effort; the exporter retries failed batches a bounded number of times.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::TelemetryConfig;
use crate::export::batch::ExportBatch;
use crate::instruments::MetricSample;
use crate::trace::SpanData;

/// Errors returned by sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The ingestion endpoint could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The ingestion endpoint rejected the batch.
    #[error("ingestion endpoint returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The sink could not be built from configuration.
    #[error("invalid sink configuration: {0}")]
    Config(String),
}

/// Destination for exported batches.
pub trait TelemetrySink: Send + Sync + 'static {
    fn export(&self, batch: &ExportBatch) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// POSTs batches as JSON to an ingestion endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSink {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TelemetrySink for HttpSink {
    async fn export(&self, batch: &ExportBatch) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Writes a summary line per batch to the log. Used when no endpoint is set.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    async fn export(&self, batch: &ExportBatch) -> Result<(), SinkError> {
        tracing::debug!(
            service = %batch.resource.service_name,
            spans = batch.spans.len(),
            samples = batch.samples.len(),
            "Telemetry batch"
        );
        for span in &batch.spans {
            tracing::trace!(
                trace_id = %span.context.trace_id,
                span_id = %span.context.span_id,
                parent_span_id = ?span.parent_span_id.map(|id| id.to_string()),
                name = %span.name,
                status = ?span.status,
                "Span ended"
            );
        }
        Ok(())
    }
}

/// Keeps every batch in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<ExportBatch>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<ExportBatch> {
        self.batches.lock().expect("memory sink mutex poisoned").clone()
    }

    /// All exported spans, in export order.
    pub fn spans(&self) -> Vec<SpanData> {
        self.batches().into_iter().flat_map(|b| b.spans).collect()
    }

    /// All exported metric samples, in export order.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.batches().into_iter().flat_map(|b| b.samples).collect()
    }

    pub fn clear(&self) {
        self.batches.lock().expect("memory sink mutex poisoned").clear();
    }
}

impl TelemetrySink for MemorySink {
    async fn export(&self, batch: &ExportBatch) -> Result<(), SinkError> {
        self.batches
            .lock()
            .expect("memory sink mutex poisoned")
            .push(batch.clone());
        Ok(())
    }
}

/// Sink selected from configuration at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredSink {
    Http(HttpSink),
    Log(LogSink),
}

impl ConfiguredSink {
    /// HTTP when an ingestion endpoint is configured, log otherwise.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, SinkError> {
        match &config.endpoint {
            Some(endpoint) => {
                let url = Url::parse(endpoint).map_err(|e| SinkError::Config(format!("endpoint {endpoint}: {e}")))?;
                let sink = HttpSink::new(url, Duration::from_secs(config.export_timeout_secs))?;
                Ok(ConfiguredSink::Http(sink))
            }
            None => Ok(ConfiguredSink::Log(LogSink)),
        }
    }
}

impl TelemetrySink for ConfiguredSink {
    async fn export(&self, batch: &ExportBatch) -> Result<(), SinkError> {
        match self {
            ConfiguredSink::Http(sink) => sink.export(batch).await,
            ConfiguredSink::Log(sink) => sink.export(batch).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::batch::Resource;

    #[tokio::test]
    async fn test_memory_sink_shares_storage_across_clones() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        let batch = ExportBatch {
            resource: Resource::new("svc", "1.0.0"),
            spans: Vec::new(),
            samples: Vec::new(),
        };

        clone.export(&batch).await.unwrap();
        assert_eq!(sink.batches().len(), 1);

        sink.clear();
        assert!(clone.batches().is_empty());
    }

    #[test]
    fn test_configured_sink_selection() {
        let mut config = TelemetryConfig::default();
        assert!(matches!(ConfiguredSink::from_config(&config), Ok(ConfiguredSink::Log(_))));

        config.endpoint = Some("http://127.0.0.1:4318/v1/telemetry".to_string());
        assert!(matches!(ConfiguredSink::from_config(&config), Ok(ConfiguredSink::Http(_))));

        config.endpoint = Some("not a url".to_string());
        assert!(matches!(ConfiguredSink::from_config(&config), Err(SinkError::Config(_))));
    }
}
