//! Span factory and the continue-or-root decision.

use std::sync::Arc;

use crate::export::ExportQueue;
use crate::propagation::{self, Extractor, SpanId, TraceContext, TraceFlags, TraceState};
use crate::trace::active::ActiveSpan;
use crate::trace::id::{IdGenerator, RandomIdGenerator};
use crate::trace::span::{now_unix_nanos, Attributes, SpanData, SpanKind, SpanStatus};

/// How a span's trace was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOrigin {
    /// No usable inbound context; a new trace was started.
    Root,
    /// Joined the trace named by an inbound carrier.
    Continued,
    /// Nested under a span of the same process.
    Child,
}

/// Creates spans. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

#[derive(Debug)]
struct TracerInner {
    queue: ExportQueue,
    ids: Box<dyn IdGenerator>,
}

impl Tracer {
    pub fn new(queue: ExportQueue) -> Self {
        Self::with_id_generator(queue, RandomIdGenerator)
    }

    pub fn with_id_generator(queue: ExportQueue, ids: impl IdGenerator + 'static) -> Self {
        Self {
            inner: Arc::new(TracerInner {
                queue,
                ids: Box::new(ids),
            }),
        }
    }

    /// Start a server span, continuing the carrier's trace when it holds a
    /// valid context and starting a new trace otherwise.
    pub fn start_from_carrier(&self, name: impl Into<String>, carrier: &dyn Extractor) -> ActiveSpan {
        match propagation::extract(carrier) {
            Some(parent) => self.start_continued(name, &parent),
            None => self.start_root(name),
        }
    }

    /// Start a server span in a new trace.
    pub fn start_root(&self, name: impl Into<String>) -> ActiveSpan {
        let context = TraceContext::new(
            self.inner.ids.new_trace_id(),
            self.inner.ids.new_span_id(),
            TraceFlags::SAMPLED,
            TraceState::default(),
        );
        self.start(name.into(), SpanKind::Server, context, None, SpanOrigin::Root)
    }

    /// Start a server span whose parent lives in another process.
    ///
    /// An invalid `remote` falls back to a new root.
    pub fn start_continued(&self, name: impl Into<String>, remote: &TraceContext) -> ActiveSpan {
        if !remote.is_valid() {
            return self.start_root(name);
        }
        let context = remote.with_span_id(self.inner.ids.new_span_id());
        self.start(
            name.into(),
            SpanKind::Server,
            context,
            Some(remote.span_id),
            SpanOrigin::Continued,
        )
    }

    /// Start an internal span under `parent` in the same trace.
    pub fn start_child(&self, name: impl Into<String>, parent: &TraceContext) -> ActiveSpan {
        if !parent.is_valid() {
            return self.start_root(name);
        }
        let context = parent.with_span_id(self.inner.ids.new_span_id());
        self.start(
            name.into(),
            SpanKind::Internal,
            context,
            Some(parent.span_id),
            SpanOrigin::Child,
        )
    }

    fn start(
        &self,
        name: String,
        kind: SpanKind,
        context: TraceContext,
        parent_span_id: Option<SpanId>,
        origin: SpanOrigin,
    ) -> ActiveSpan {
        let data = SpanData {
            name,
            kind,
            context,
            parent_span_id,
            start_time_unix_nano: now_unix_nanos(),
            end_time_unix_nano: None,
            status: SpanStatus::Unset,
            error_description: None,
            attributes: Attributes::new(),
            events: Vec::new(),
        };
        ActiveSpan::new(data, origin, self.inner.queue.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{inject, TraceId};
    use std::collections::{HashMap, HashSet};

    fn tracer() -> Tracer {
        let (queue, _rx) = ExportQueue::bounded(1);
        Tracer::new(queue)
    }

    fn remote() -> TraceContext {
        TraceContext::new(
            TraceId::from_u128(0x4bf92f3577b34da6a3ce929d0e0e4736),
            SpanId::from_u64(0x00f067aa0ba902b7),
            TraceFlags::SAMPLED,
            TraceState::new("vendor=1"),
        )
    }

    #[test]
    fn test_valid_carrier_continues_trace() {
        let tracer = tracer();
        let parent = remote();
        let mut carrier: HashMap<String, String> = HashMap::new();
        inject(&parent, &mut carrier);

        let span = tracer.start_from_carrier("GET /posts", &carrier);

        assert_eq!(span.origin(), SpanOrigin::Continued);
        assert_eq!(span.context().trace_id, parent.trace_id);
        assert_eq!(span.parent_span_id(), Some(parent.span_id));
        assert_ne!(span.context().span_id, parent.span_id);
        assert_eq!(span.context().trace_state, parent.trace_state);
    }

    #[test]
    fn test_missing_or_malformed_carrier_starts_root() {
        let tracer = tracer();
        let mut carrier: HashMap<String, String> = HashMap::new();

        let first = tracer.start_from_carrier("GET /users", &carrier);
        carrier.insert("traceparent".to_string(), "00-zz-00f067aa0ba902b7-01".to_string());
        let second = tracer.start_from_carrier("GET /users", &carrier);

        for span in [&first, &second] {
            assert_eq!(span.origin(), SpanOrigin::Root);
            assert!(span.parent_span_id().is_none());
            assert!(span.context().is_valid());
            assert!(span.context().is_sampled());
        }
        assert_ne!(first.context().trace_id, second.context().trace_id);
    }

    #[test]
    fn test_root_trace_ids_are_never_reused() {
        let tracer = tracer();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let span = tracer.start_root("GET /users");
            assert!(seen.insert(span.context().trace_id));
        }
    }

    #[test]
    fn test_child_shares_trace_and_links_parent() {
        let tracer = tracer();
        let request = tracer.start_root("GET /users");
        let child = tracer.start_child("get_user", request.context());

        assert_eq!(child.origin(), SpanOrigin::Child);
        assert_eq!(child.context().trace_id, request.context().trace_id);
        assert_eq!(child.parent_span_id(), Some(request.context().span_id));
    }

    #[test]
    fn test_invalid_remote_falls_back_to_root() {
        let tracer = tracer();
        let invalid = TraceContext::new(
            TraceId::INVALID,
            SpanId::from_u64(1),
            TraceFlags::SAMPLED,
            TraceState::default(),
        );
        let span = tracer.start_continued("GET /posts", &invalid);
        assert_eq!(span.origin(), SpanOrigin::Root);
    }
}
