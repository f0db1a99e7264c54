//! Metric instruments with trace exemplars.
//!
//! # Responsibilities
//! - Accumulate counters, histograms and up/down counters per attribute set
//! - Keep the latest exemplar per series (per bucket for histograms)
//! - Emit one `MetricSample` per measurement into the export queue
//! - Render current state as OpenMetrics text for scraping
//!
//! # Design Decisions
//! - Accumulation is lock-free: atomics per series, a `DashMap` for series
//!   lookup and `ArcSwapOption` for exemplar slots
//! - Instruments are created once per service by `ServiceInstruments` and
//!   shared through `Arc`
//! - The in-flight gauge is balanced by an RAII guard, not by handler code

use std::sync::Arc;

use dashmap::DashMap;

pub mod attributes;
pub mod counter;
pub mod exemplar;
pub mod histogram;
pub mod render;
pub mod sample;
pub mod set;
pub mod updown;

pub use attributes::MetricAttributes;
pub use counter::{Counter, CounterSnapshot};
pub use exemplar::{Exemplar, ExemplarSlot};
pub use histogram::{BucketSnapshot, Histogram, HistogramSnapshot, DEFAULT_BUCKETS};
pub use render::OPENMETRICS_CONTENT_TYPE;
pub use sample::{InstrumentKind, MetricSample};
pub use set::{request_attributes, InFlightGuard, Outcome, ServiceInstruments};
pub use updown::UpDownCounter;

/// Fetch or create the series for `attributes` without holding a shard lock
/// past the lookup.
pub(crate) fn series_for<T>(
    map: &DashMap<MetricAttributes, Arc<T>>,
    attributes: &MetricAttributes,
    make: impl FnOnce() -> T,
) -> Arc<T> {
    if let Some(series) = map.get(attributes) {
        return Arc::clone(series.value());
    }
    Arc::clone(map.entry(attributes.clone()).or_insert_with(|| Arc::new(make())).value())
}
