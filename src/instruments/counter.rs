//! Monotonic counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::export::ExportQueue;
use crate::instruments::attributes::MetricAttributes;
use crate::instruments::exemplar::{Exemplar, ExemplarSlot};
use crate::instruments::sample::{InstrumentKind, MetricSample};
use crate::instruments::series_for;
use crate::propagation::TraceContext;
use crate::trace::now_unix_nanos;

#[derive(Debug, Default)]
struct CounterSeries {
    value: AtomicU64,
    exemplar: ExemplarSlot,
}

/// Point-in-time view of one counter series.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSnapshot {
    pub attributes: MetricAttributes,
    pub value: u64,
    pub exemplar: Option<Exemplar>,
}

#[derive(Debug)]
pub struct Counter {
    name: String,
    queue: ExportQueue,
    series: DashMap<MetricAttributes, Arc<CounterSeries>>,
}

impl Counter {
    pub fn new(name: impl Into<String>, queue: ExportQueue) -> Self {
        Self {
            name: name.into(),
            queue,
            series: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add `value` to the series for `attributes`, keeping an exemplar when
    /// `context` is a valid trace context.
    pub fn add(&self, value: u64, attributes: &MetricAttributes, context: Option<&TraceContext>) {
        let series = series_for(&self.series, attributes, CounterSeries::default);
        series.value.fetch_add(value, Ordering::Relaxed);

        let exemplar = context.and_then(|ctx| Exemplar::from_context(ctx, value as f64));
        if let Some(exemplar) = &exemplar {
            series.exemplar.store(exemplar.clone());
        }

        self.queue.push_sample(MetricSample {
            instrument_name: self.name.clone(),
            kind: InstrumentKind::Counter,
            value: value as f64,
            attributes: attributes.clone(),
            exemplar,
            recorded_at_unix_nano: now_unix_nanos(),
        });
    }

    pub fn value(&self, attributes: &MetricAttributes) -> u64 {
        self.series
            .get(attributes)
            .map(|s| s.value.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum across all series.
    pub fn total(&self) -> u64 {
        self.series.iter().map(|s| s.value.load(Ordering::Relaxed)).sum()
    }

    /// All series, sorted by attributes.
    pub fn snapshot(&self) -> Vec<CounterSnapshot> {
        let mut out: Vec<CounterSnapshot> = self
            .series
            .iter()
            .map(|entry| CounterSnapshot {
                attributes: entry.key().clone(),
                value: entry.value().value.load(Ordering::Relaxed),
                exemplar: entry.value().exemplar.load(),
            })
            .collect();
        out.sort_by(|a, b| a.attributes.cmp(&b.attributes));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::TelemetryItem;
    use crate::propagation::{SpanId, TraceFlags, TraceId, TraceState};

    #[test]
    fn test_add_accumulates_per_series_and_emits_samples() {
        let (queue, mut rx) = ExportQueue::bounded(16);
        let counter = Counter::new("svc_requests_total", queue);
        let ok = MetricAttributes::new().with("outcome", "ok");
        let err = MetricAttributes::new().with("outcome", "error");

        counter.add(1, &ok, None);
        counter.add(2, &ok, None);
        counter.add(1, &err, None);

        assert_eq!(counter.value(&ok), 3);
        assert_eq!(counter.value(&err), 1);
        assert_eq!(counter.total(), 4);

        let mut samples = 0;
        while let Ok(TelemetryItem::Sample(sample)) = rx.try_recv() {
            assert_eq!(sample.kind, InstrumentKind::Counter);
            assert!(sample.exemplar.is_none());
            samples += 1;
        }
        assert_eq!(samples, 3);
    }

    #[test]
    fn test_exemplar_attached_only_with_valid_context() {
        let (queue, _rx) = ExportQueue::bounded(16);
        let counter = Counter::new("svc_requests_total", queue);
        let attrs = MetricAttributes::new();

        counter.add(1, &attrs, None);
        assert!(counter.snapshot()[0].exemplar.is_none());

        let ctx = TraceContext::new(TraceId::from_u128(5), SpanId::from_u64(6), TraceFlags::SAMPLED, TraceState::default());
        counter.add(1, &attrs, Some(&ctx));
        let exemplar = counter.snapshot()[0].exemplar.clone().unwrap();
        assert_eq!(exemplar.trace_id, ctx.trace_id);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let (queue, _rx) = ExportQueue::bounded(1);
        let counter = Arc::new(Counter::new("svc_requests_total", queue));
        let attrs = MetricAttributes::new().with("outcome", "ok");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let attrs = attrs.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.add(1, &attrs, None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.value(&attrs), 8000);
    }
}
