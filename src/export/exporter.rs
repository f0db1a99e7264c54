//! Background batch exporter.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::export::batch::{ExportBatch, Resource};
use crate::export::queue::TelemetryItem;
use crate::export::retry::RetryPolicy;
use crate::export::sink::TelemetrySink;
use crate::instruments::MetricSample;
use crate::observability::metrics;
use crate::trace::SpanData;

/// Exporter tuning.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Flush as soon as this many items are buffered.
    pub batch_size: usize,
    /// Flush at least this often when anything is buffered.
    pub flush_interval: Duration,
    /// Upper bound for a single sink call.
    pub export_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            flush_interval: Duration::from_secs(5),
            export_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Owner handle for the exporter task.
pub struct ExporterHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ExporterHandle {
    /// Stop the exporter after draining and exporting everything queued.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.join).await {
            tracing::error!(error = %e, "Telemetry exporter task failed");
        }
    }
}

/// Spawn the exporter task on the current tokio runtime.
pub fn spawn_exporter<S: TelemetrySink>(
    rx: mpsc::Receiver<TelemetryItem>,
    sink: S,
    resource: Resource,
    config: ExporterConfig,
) -> ExporterHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let exporter = BatchExporter {
        rx,
        sink,
        resource,
        config,
        spans: Vec::new(),
        samples: Vec::new(),
    };
    let join = tokio::spawn(exporter.run(shutdown_rx));

    ExporterHandle {
        shutdown: Some(shutdown_tx),
        join,
    }
}

struct BatchExporter<S> {
    rx: mpsc::Receiver<TelemetryItem>,
    sink: S,
    resource: Resource,
    config: ExporterConfig,
    spans: Vec<SpanData>,
    samples: Vec<MetricSample>,
}

impl<S: TelemetrySink> BatchExporter<S> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let period = self.config.flush_interval;
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            service = %self.resource.service_name,
            batch_size = self.config.batch_size,
            flush_interval_ms = self.config.flush_interval.as_millis() as u64,
            "Telemetry exporter starting"
        );

        loop {
            tokio::select! {
                item = self.rx.recv() => match item {
                    Some(TelemetryItem::Flush(done)) => {
                        self.flush().await;
                        let _ = done.send(());
                    }
                    Some(item) => {
                        self.buffer(item);
                        if self.pending() >= self.config.batch_size {
                            self.flush().await;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => self.flush().await,
                _ = &mut shutdown => {
                    self.drain().await;
                    break;
                }
            }
        }

        self.flush().await;
        tracing::info!("Telemetry exporter stopped");
    }

    /// Pull whatever is already queued, export it, then answer flush waiters.
    async fn drain(&mut self) {
        let mut waiters = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            match item {
                TelemetryItem::Flush(done) => waiters.push(done),
                other => self.buffer(other),
            }
        }
        self.flush().await;
        for done in waiters {
            let _ = done.send(());
        }
    }

    fn buffer(&mut self, item: TelemetryItem) {
        match item {
            TelemetryItem::Span(span) => self.spans.push(span),
            TelemetryItem::Sample(sample) => self.samples.push(sample),
            TelemetryItem::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    fn pending(&self) -> usize {
        self.spans.len() + self.samples.len()
    }

    async fn flush(&mut self) {
        if self.pending() == 0 {
            return;
        }

        let batch = ExportBatch {
            resource: self.resource.clone(),
            spans: std::mem::take(&mut self.spans),
            samples: std::mem::take(&mut self.samples),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = time::timeout(self.config.export_timeout, self.sink.export(&batch)).await;
            let error = match outcome {
                Ok(Ok(())) => {
                    metrics::record_batch_exported(batch.spans.len(), batch.samples.len());
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {:?}", self.config.export_timeout),
            };

            if !self.config.retry.should_retry(attempt) {
                tracing::warn!(attempt, items = batch.len(), error = %error, "Dropping telemetry batch");
                metrics::record_export_failure();
                return;
            }

            let delay = self.config.retry.backoff(attempt);
            tracing::debug!(attempt, delay = ?delay, error = %error, "Retrying telemetry export");
            time::sleep(delay).await;
        }
    }
}
