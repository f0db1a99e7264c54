//! Fixed-bucket histogram.

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

/// Upper bounds in seconds, suited to request latencies.
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Debug)]
struct HistogramSeries {
    /// Non-cumulative counts; the last slot is the `+Inf` bucket.
    buckets: Vec<AtomicU64>,
    exemplars: Vec<ExemplarSlot>,
    count: AtomicU64,
    sum_bits: AtomicU64,
}

impl HistogramSeries {
    fn new(slots: usize) -> Self {
        Self {
            buckets: (0..slots).map(|_| AtomicU64::new(0)).collect(),
            exemplars: (0..slots).map(|_| ExemplarSlot::default()).collect(),
            count: AtomicU64::new(0),
            sum_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn add_to_sum(&self, value: f64) {
        let mut current = self.sum_bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self
                .sum_bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

/// One bucket of a snapshot. Counts are cumulative, as exposed to scrapers.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSnapshot {
    /// `f64::INFINITY` for the overflow bucket.
    pub upper_bound: f64,
    pub cumulative_count: u64,
    pub exemplar: Option<Exemplar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub attributes: MetricAttributes,
    pub buckets: Vec<BucketSnapshot>,
    pub count: u64,
    pub sum: f64,
}

#[derive(Debug)]
pub struct Histogram {
    name: String,
    bounds: Vec<f64>,
    queue: ExportQueue,
    series: DashMap<MetricAttributes, Arc<HistogramSeries>>,
}

impl Histogram {
    /// Non-finite bounds are discarded; the rest are sorted and deduplicated.
    pub fn new(name: impl Into<String>, bounds: impl IntoIterator<Item = f64>, queue: ExportQueue) -> Self {
        let mut bounds: Vec<f64> = bounds.into_iter().filter(|b| b.is_finite()).collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();

        Self {
            name: name.into(),
            bounds,
            queue,
            series: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Observe `value`. NaN is ignored.
    pub fn record(&self, value: f64, attributes: &MetricAttributes, context: Option<&TraceContext>) {
        if value.is_nan() {
            return;
        }
        let slots = self.bounds.len() + 1;
        let series = series_for(&self.series, attributes, || HistogramSeries::new(slots));

        let index = self.bounds.partition_point(|bound| *bound < value);
        series.buckets[index].fetch_add(1, Ordering::Relaxed);
        series.count.fetch_add(1, Ordering::Relaxed);
        series.add_to_sum(value);

        let exemplar = context.and_then(|ctx| Exemplar::from_context(ctx, value));
        if let Some(exemplar) = &exemplar {
            series.exemplars[index].store(exemplar.clone());
        }

        self.queue.push_sample(MetricSample {
            instrument_name: self.name.clone(),
            kind: InstrumentKind::Histogram,
            value,
            attributes: attributes.clone(),
            exemplar,
            recorded_at_unix_nano: now_unix_nanos(),
        });
    }

    /// Observation count for one series.
    pub fn count(&self, attributes: &MetricAttributes) -> u64 {
        self.series
            .get(attributes)
            .map(|s| s.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Observation count across all series.
    pub fn total_count(&self) -> u64 {
        self.series.iter().map(|s| s.count.load(Ordering::Relaxed)).sum()
    }

    /// All series, sorted by attributes.
    pub fn snapshot(&self) -> Vec<HistogramSnapshot> {
        let mut out: Vec<HistogramSnapshot> = self
            .series
            .iter()
            .map(|entry| {
                let series = entry.value();
                let mut cumulative = 0;
                let buckets = series
                    .buckets
                    .iter()
                    .zip(&series.exemplars)
                    .enumerate()
                    .map(|(i, (count, exemplar))| {
                        cumulative += count.load(Ordering::Relaxed);
                        BucketSnapshot {
                            upper_bound: self.bounds.get(i).copied().unwrap_or(f64::INFINITY),
                            cumulative_count: cumulative,
                            exemplar: exemplar.load(),
                        }
                    })
                    .collect();

                HistogramSnapshot {
                    attributes: entry.key().clone(),
                    buckets,
                    count: series.count.load(Ordering::Relaxed),
                    sum: f64::from_bits(series.sum_bits.load(Ordering::Relaxed)),
                }
            })
            .collect();
        out.sort_by(|a, b| a.attributes.cmp(&b.attributes));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{SpanId, TraceFlags, TraceId, TraceState};

    fn histogram() -> Histogram {
        let (queue, _rx) = ExportQueue::bounded(1);
        Histogram::new("svc_request_duration_seconds", [0.1, 1.0, 0.5, f64::NAN, 0.5], queue)
    }

    #[test]
    fn test_bounds_are_sanitized() {
        assert_eq!(histogram().bounds(), &[0.1, 0.5, 1.0]);
    }

    #[test]
    fn test_values_land_in_inclusive_upper_bucket() {
        let histogram = histogram();
        let attrs = MetricAttributes::new();

        histogram.record(0.1, &attrs, None);
        histogram.record(0.3, &attrs, None);
        histogram.record(5.0, &attrs, None);
        histogram.record(f64::NAN, &attrs, None);

        let snapshot = &histogram.snapshot()[0];
        let cumulative: Vec<u64> = snapshot.buckets.iter().map(|b| b.cumulative_count).collect();
        assert_eq!(cumulative, vec![1, 2, 2, 3]);
        assert_eq!(snapshot.count, 3);
        assert!((snapshot.sum - 5.4).abs() < 1e-9);
        assert!(snapshot.buckets[3].upper_bound.is_infinite());
    }

    #[test]
    fn test_exemplar_stored_in_matching_bucket() {
        let histogram = histogram();
        let attrs = MetricAttributes::new();
        let ctx = TraceContext::new(TraceId::from_u128(3), SpanId::from_u64(4), TraceFlags::SAMPLED, TraceState::default());

        histogram.record(0.3, &attrs, Some(&ctx));

        let snapshot = &histogram.snapshot()[0];
        assert!(snapshot.buckets[0].exemplar.is_none());
        let exemplar = snapshot.buckets[1].exemplar.clone().unwrap();
        assert_eq!(exemplar.trace_id, ctx.trace_id);
        assert_eq!(exemplar.value, 0.3);
    }
}
