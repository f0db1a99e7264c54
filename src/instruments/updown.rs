//! Up/down counter, used for in-flight request tracking.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::export::ExportQueue;
use crate::instruments::attributes::MetricAttributes;
use crate::instruments::exemplar::Exemplar;
use crate::instruments::sample::{InstrumentKind, MetricSample};
use crate::instruments::series_for;
use crate::propagation::TraceContext;
use crate::trace::now_unix_nanos;

#[derive(Debug)]
pub struct UpDownCounter {
    name: String,
    queue: ExportQueue,
    series: DashMap<MetricAttributes, Arc<AtomicI64>>,
}

impl UpDownCounter {
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

    pub fn add(&self, delta: i64, attributes: &MetricAttributes, context: Option<&TraceContext>) {
        let series = series_for(&self.series, attributes, || AtomicI64::new(0));
        series.fetch_add(delta, Ordering::Relaxed);

        self.queue.push_sample(MetricSample {
            instrument_name: self.name.clone(),
            kind: InstrumentKind::UpDownCounter,
            value: delta as f64,
            attributes: attributes.clone(),
            exemplar: context.and_then(|ctx| Exemplar::from_context(ctx, delta as f64)),
            recorded_at_unix_nano: now_unix_nanos(),
        });
    }

    pub fn value(&self, attributes: &MetricAttributes) -> i64 {
        self.series
            .get(attributes)
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum across all series.
    pub fn total(&self) -> i64 {
        self.series.iter().map(|s| s.load(Ordering::Relaxed)).sum()
    }

    /// All series with their current values, sorted by attributes.
    pub fn snapshot(&self) -> Vec<(MetricAttributes, i64)> {
        let mut out: Vec<(MetricAttributes, i64)> = self
            .series
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
