//! OpenMetrics text exposition.

use std::fmt::Write;

use crate::instruments::attributes::MetricAttributes;
use crate::instruments::counter::Counter;
use crate::instruments::exemplar::Exemplar;
use crate::instruments::histogram::Histogram;
use crate::instruments::updown::UpDownCounter;

pub const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

pub(crate) fn counter(out: &mut String, counter: &Counter, help: &str) {
    let family = counter.name().strip_suffix("_total").unwrap_or(counter.name());
    header(out, family, "counter", help);
    for series in counter.snapshot() {
        let _ = write!(out, "{family}_total{} {}", labels(&series.attributes, None), series.value);
        exemplar(out, series.exemplar.as_ref());
        out.push('\n');
    }
}

pub(crate) fn histogram(out: &mut String, histogram: &Histogram, help: &str) {
    let family = histogram.name();
    header(out, family, "histogram", help);
    for series in histogram.snapshot() {
        for bucket in &series.buckets {
            let le = if bucket.upper_bound.is_infinite() {
                "+Inf".to_string()
            } else {
                format!("{:?}", bucket.upper_bound)
            };
            let _ = write!(
                out,
                "{family}_bucket{} {}",
                labels(&series.attributes, Some(&le)),
                bucket.cumulative_count
            );
            exemplar(out, bucket.exemplar.as_ref());
            out.push('\n');
        }
        let plain = labels(&series.attributes, None);
        let _ = writeln!(out, "{family}_count{plain} {}", series.count);
        let _ = writeln!(out, "{family}_sum{plain} {:?}", series.sum);
    }
}

pub(crate) fn gauge(out: &mut String, gauge: &UpDownCounter, help: &str) {
    let family = gauge.name();
    header(out, family, "gauge", help);
    for (attributes, value) in gauge.snapshot() {
        let _ = writeln!(out, "{family}{} {value}", labels(&attributes, None));
    }
}

pub(crate) fn finish(out: &mut String) {
    out.push_str("# EOF\n");
}

fn header(out: &mut String, family: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# TYPE {family} {kind}");
    let _ = writeln!(out, "# HELP {family} {help}");
}

fn labels(attributes: &MetricAttributes, le: Option<&str>) -> String {
    let mut pairs: Vec<String> = attributes
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", label_name(k), escape(v)))
        .collect();
    if let Some(le) = le {
        pairs.push(format!("le=\"{le}\""));
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

fn exemplar(out: &mut String, exemplar: Option<&Exemplar>) {
    let Some(e) = exemplar else {
        return;
    };
    let seconds = e.recorded_at_unix_nano as f64 / 1e9;
    let _ = write!(
        out,
        " # {{trace_id=\"{}\",span_id=\"{}\"}} {:?} {:.3}",
        e.trace_id, e.span_id, e.value, seconds
    );
}

/// Attribute keys such as `http.route` become `http_route`.
fn label_name(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn escape(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', "\\\"").replace('\n', "\\n")
}
