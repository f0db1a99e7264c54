//! The per-service instrument set and in-flight guard.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::export::ExportQueue;
use crate::instruments::attributes::MetricAttributes;
use crate::instruments::counter::Counter;
use crate::instruments::histogram::Histogram;
use crate::instruments::render;
use crate::instruments::updown::UpDownCounter;
use crate::propagation::TraceContext;

pub const ATTR_METHOD: &str = "http.request.method";
pub const ATTR_ROUTE: &str = "http.route";
pub const ATTR_STATUS: &str = "http.response.status_code";
pub const ATTR_OUTCOME: &str = "outcome";
pub const ATTR_ERROR_TYPE: &str = "error.type";

/// Classification of a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Invalid,
    NotFound,
    Error,
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Invalid => "invalid",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
            Outcome::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruments shared by every handler of one service.
#[derive(Debug)]
pub struct ServiceInstruments {
    requests: Counter,
    duration: Histogram,
    active: Arc<UpDownCounter>,
    errors: Counter,
}

impl ServiceInstruments {
    /// `prefix` is normalised to a metric-name-safe form (`user-service`
    /// becomes `user_service`).
    pub fn new(prefix: &str, buckets: impl IntoIterator<Item = f64>, queue: ExportQueue) -> Self {
        let prefix: String = prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();

        Self {
            requests: Counter::new(format!("{prefix}_requests_total"), queue.clone()),
            duration: Histogram::new(format!("{prefix}_request_duration_seconds"), buckets, queue.clone()),
            active: Arc::new(UpDownCounter::new(format!("{prefix}_active_requests"), queue.clone())),
            errors: Counter::new(format!("{prefix}_errors_total"), queue),
        }
    }

    pub fn requests(&self) -> &Counter {
        &self.requests
    }

    pub fn duration(&self) -> &Histogram {
        &self.duration
    }

    pub fn active_requests(&self) -> &UpDownCounter {
        &self.active
    }

    pub fn errors(&self) -> &Counter {
        &self.errors
    }

    /// Increment the in-flight gauge. The returned guard decrements it on drop.
    ///
    /// `context` is attached as exemplar to both the increment and the
    /// decrement.
    pub fn track_in_flight(&self, method: &str, route: &str, context: Option<&TraceContext>) -> InFlightGuard {
        let attributes = MetricAttributes::new().with(ATTR_METHOD, method).with(ATTR_ROUTE, route);
        let context = context.cloned();
        self.active.add(1, &attributes, context.as_ref());
        InFlightGuard {
            gauge: Arc::clone(&self.active),
            attributes,
            context,
        }
    }

    /// One count and one duration observation for a finished request.
    pub fn record_request(&self, attributes: &MetricAttributes, duration: Duration, context: Option<&TraceContext>) {
        self.requests.add(1, attributes, context);
        self.duration.record(duration.as_secs_f64(), attributes, context);
    }

    pub fn record_error(&self, attributes: &MetricAttributes, context: Option<&TraceContext>) {
        self.errors.add(1, attributes, context);
    }

    /// Current state in OpenMetrics text format, exemplars included.
    pub fn render_openmetrics(&self) -> String {
        let mut out = String::new();
        render::counter(&mut out, &self.requests, "Requests handled.");
        render::histogram(&mut out, &self.duration, "Request duration in seconds.");
        render::gauge(&mut out, &self.active, "Requests currently in flight.");
        render::counter(&mut out, &self.errors, "Requests that failed in a collaborator.");
        render::finish(&mut out);
        out
    }
}

/// Attributes for a finished request.
pub fn request_attributes(method: &str, route: &str, status: u16, outcome: Outcome) -> MetricAttributes {
    MetricAttributes::new()
        .with(ATTR_METHOD, method)
        .with(ATTR_ROUTE, route)
        .with(ATTR_STATUS, status)
        .with(ATTR_OUTCOME, outcome)
}

/// Decrements the in-flight gauge when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    gauge: Arc<UpDownCounter>,
    attributes: MetricAttributes,
    context: Option<TraceContext>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.add(-1, &self.attributes, self.context.as_ref());
    }
}
