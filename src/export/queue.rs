//! Bounded hand-off between the request path and the exporter task.

use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;

use crate::instruments::MetricSample;
use crate::observability::metrics;
use crate::trace::SpanData;

/// Items carried from producers to the exporter task.
#[derive(Debug)]
pub enum TelemetryItem {
    Span(SpanData),
    Sample(MetricSample),
    /// Export everything received so far, then acknowledge.
    Flush(oneshot::Sender<()>),
}

/// Producer handle. Cheap to clone; shared by the tracer and instruments.
#[derive(Debug, Clone)]
pub struct ExportQueue {
    tx: mpsc::Sender<TelemetryItem>,
}

impl ExportQueue {
    /// Create a queue holding at most `capacity` pending items.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<TelemetryItem>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue an ended span. Dropped if the queue is full.
    pub fn push_span(&self, span: SpanData) {
        self.offer(TelemetryItem::Span(span), "span");
    }

    /// Enqueue a metric sample. Dropped if the queue is full.
    pub fn push_sample(&self, sample: MetricSample) {
        self.offer(TelemetryItem::Sample(sample), "sample");
    }

    /// Wait until everything enqueued before this call has been exported.
    ///
    /// Returns `false` if the exporter is gone.
    pub async fn flush(&self) -> bool {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(TelemetryItem::Flush(done_tx)).await.is_err() {
            return false;
        }
        done_rx.await.is_ok()
    }

    /// Number of items that can still be enqueued without dropping.
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }

    fn offer(&self, item: TelemetryItem, kind: &'static str) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                metrics::record_item_dropped(kind, "queue_full");
                tracing::debug!(kind, "Telemetry queue full, dropping item");
            }
            Err(TrySendError::Closed(_)) => {
                metrics::record_item_dropped(kind, "exporter_stopped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::{InstrumentKind, MetricAttributes};

    fn sample(value: f64) -> MetricSample {
        MetricSample {
            instrument_name: "test_total".to_string(),
            kind: InstrumentKind::Counter,
            value,
            attributes: MetricAttributes::new(),
            exemplar: None,
            recorded_at_unix_nano: 0,
        }
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (queue, mut rx) = ExportQueue::bounded(2);
        queue.push_sample(sample(1.0));
        queue.push_sample(sample(2.0));
        queue.push_sample(sample(3.0));

        let mut values = Vec::new();
        while let Ok(TelemetryItem::Sample(s)) = rx.try_recv() {
            values.push(s.value);
        }
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_closed_queue_does_not_panic() {
        let (queue, rx) = ExportQueue::bounded(4);
        drop(rx);
        queue.push_sample(sample(1.0));
    }

    #[tokio::test]
    async fn test_flush_without_exporter_returns_false() {
        let (queue, rx) = ExportQueue::bounded(4);
        drop(rx);
        assert!(!queue.flush().await);
    }
}
