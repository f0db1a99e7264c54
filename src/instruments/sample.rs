use serde::Serialize;

use crate::instruments::attributes::MetricAttributes;
use crate::instruments::exemplar::Exemplar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Counter,
    Histogram,
    UpDownCounter,
}

/// One measurement, as shipped to the telemetry sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub instrument_name: String,
    pub kind: InstrumentKind,
    pub value: f64,
    pub attributes: MetricAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemplar: Option<Exemplar>,
    pub recorded_at_unix_nano: u64,
}
