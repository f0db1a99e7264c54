//! RAII span ownership.

use crate::export::ExportQueue;
use crate::propagation::{SpanId, TraceContext};
use crate::trace::span::{now_unix_nanos, AttributeValue, Attributes, SpanData, SpanEvent, SpanStatus};
use crate::trace::tracer::SpanOrigin;

/// A span that has started and not yet been handed to the exporter.
///
/// The span ends when [`ActiveSpan::end`] is called or when the value is
/// dropped, whichever comes first. Later mutations are ignored.
#[derive(Debug)]
pub struct ActiveSpan {
    context: TraceContext,
    parent_span_id: Option<SpanId>,
    origin: SpanOrigin,
    data: Option<SpanData>,
    queue: ExportQueue,
}

impl ActiveSpan {
    pub(crate) fn new(data: SpanData, origin: SpanOrigin, queue: ExportQueue) -> Self {
        Self {
            context: data.context.clone(),
            parent_span_id: data.parent_span_id,
            origin,
            data: Some(data),
            queue,
        }
    }

    /// Context to propagate and to use as parent for child spans.
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    pub fn origin(&self) -> SpanOrigin {
        self.origin
    }

    pub fn is_ended(&self) -> bool {
        self.data.is_none()
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        if let Some(data) = self.data.as_mut() {
            data.attributes.set(key, value);
        }
    }

    pub fn set_status_ok(&mut self) {
        if let Some(data) = self.data.as_mut() {
            if data.status == SpanStatus::Unset {
                data.status = SpanStatus::Ok;
            }
        }
    }

    /// Mark the span failed and attach an exception event.
    pub fn record_error(&mut self, description: impl Into<String>, error_type: &str) {
        let Some(data) = self.data.as_mut() else {
            return;
        };
        let description = description.into();

        let mut event_attributes = Attributes::new();
        event_attributes.set("exception.type", error_type);
        event_attributes.set("exception.message", description.clone());
        data.events.push(SpanEvent {
            name: "exception".to_string(),
            time_unix_nano: now_unix_nanos(),
            attributes: event_attributes,
        });

        data.attributes.set("error.type", error_type);
        data.status = SpanStatus::Error;
        data.error_description = Some(description);
    }

    /// End the span and enqueue it for export. Subsequent calls do nothing.
    pub fn end(&mut self) {
        let Some(mut data) = self.data.take() else {
            return;
        };
        data.end_time_unix_nano = Some(now_unix_nanos().max(data.start_time_unix_nano));

        tracing::trace!(
            trace_id = %data.context.trace_id,
            span_id = %data.context.span_id,
            name = %data.name,
            "Span ended"
        );
        self.queue.push_span(data);
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::TelemetryItem;
    use crate::trace::Tracer;
    use tokio::sync::mpsc;

    fn ended_spans(rx: &mut mpsc::Receiver<TelemetryItem>) -> Vec<SpanData> {
        let mut spans = Vec::new();
        while let Ok(item) = rx.try_recv() {
            if let TelemetryItem::Span(span) = item {
                spans.push(span);
            }
        }
        spans
    }

    #[test]
    fn test_end_is_idempotent() {
        let (queue, mut rx) = ExportQueue::bounded(8);
        let tracer = Tracer::new(queue);

        let mut span = tracer.start_root("GET /users");
        span.end();
        span.end();
        drop(span);

        assert_eq!(ended_spans(&mut rx).len(), 1);
    }

    #[test]
    fn test_drop_ends_span() {
        let (queue, mut rx) = ExportQueue::bounded(8);
        let tracer = Tracer::new(queue);

        {
            let mut span = tracer.start_root("GET /users");
            span.set_attribute("http.route", "/users");
        }

        let spans = ended_spans(&mut rx);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].end_time_unix_nano.is_some());
        assert_eq!(spans[0].attributes.get("http.route").and_then(AttributeValue::as_str), Some("/users"));
    }

    #[test]
    fn test_mutations_after_end_are_ignored() {
        let (queue, mut rx) = ExportQueue::bounded(8);
        let tracer = Tracer::new(queue);

        let mut span = tracer.start_root("GET /users");
        span.end();
        span.set_attribute("late", true);
        span.record_error("boom", "StoreError");
        assert!(span.is_ended());

        let spans = ended_spans(&mut rx);
        assert!(spans[0].attributes.get("late").is_none());
        assert_eq!(spans[0].status, SpanStatus::Unset);
    }

    #[test]
    fn test_record_error_sets_status_and_event() {
        let (queue, mut rx) = ExportQueue::bounded(8);
        let tracer = Tracer::new(queue);

        let mut span = tracer.start_root("get_user");
        span.record_error("connection reset", "StoreError");
        span.set_status_ok();
        span.end();

        let spans = ended_spans(&mut rx);
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert_eq!(spans[0].error_description.as_deref(), Some("connection reset"));
        assert_eq!(spans[0].attributes.get("error.type").and_then(AttributeValue::as_str), Some("StoreError"));
        assert_eq!(spans[0].events.len(), 1);
        assert_eq!(spans[0].events[0].name, "exception");
    }

    #[tokio::test]
    async fn test_cancelled_future_ends_span() {
        let (queue, mut rx) = ExportQueue::bounded(8);
        let tracer = Tracer::new(queue);

        let task = tokio::spawn(async move {
            let _span = tracer.start_root("slow");
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        task.abort();
        let _ = task.await;

        assert_eq!(ended_spans(&mut rx).len(), 1);
    }
}
