//! W3C `traceparent` / `tracestate` encoding.
//!
//! `traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01`
//!
//! Four dash-separated fields: version (2 hex), trace id (32 hex),
//! parent span id (16 hex), flags (2 hex). All lower case.

use crate::propagation::carrier::{Extractor, Injector};
use crate::propagation::context::{SpanId, TraceContext, TraceFlags, TraceId, TraceState};

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

const SUPPORTED_VERSION: u8 = 0;
const INVALID_VERSION: u8 = 0xff;

/// Read a trace context from the carrier.
///
/// Returns `None` when the header is absent or malformed, or when either id
/// is all-zero. Callers treat `None` as "start a new root trace".
pub fn extract(carrier: &dyn Extractor) -> Option<TraceContext> {
    let header = carrier.get(TRACEPARENT_HEADER)?.trim();
    let ctx = parse_traceparent(header);

    if ctx.is_none() && !header.is_empty() {
        tracing::debug!(traceparent = header, "Discarding malformed traceparent");
    }

    let ctx = ctx?;
    let trace_state = carrier
        .get(TRACESTATE_HEADER)
        .map(TraceState::new)
        .unwrap_or_default();

    Some(TraceContext { trace_state, ..ctx })
}

/// Write the trace context into the carrier.
///
/// Sets `traceparent` (replacing any previous value) and, when the vendor
/// state is non-empty, `tracestate`. Invalid contexts are never written.
pub fn inject(ctx: &TraceContext, carrier: &mut dyn Injector) {
    if !ctx.is_valid() {
        return;
    }

    carrier.set(TRACEPARENT_HEADER, format_traceparent(ctx));
    if !ctx.trace_state.is_empty() {
        carrier.set(TRACESTATE_HEADER, ctx.trace_state.as_str().to_string());
    }
}

/// Render just the `traceparent` value.
pub fn format_traceparent(ctx: &TraceContext) -> String {
    format!(
        "{:02x}-{}-{}-{:02x}",
        SUPPORTED_VERSION,
        ctx.trace_id,
        ctx.span_id,
        ctx.trace_flags.to_u8()
    )
}

fn parse_traceparent(header: &str) -> Option<TraceContext> {
    let parts: Vec<&str> = header.split('-').collect();
    if parts.len() < 4 {
        return None;
    }

    if parts[0].len() != 2 {
        return None;
    }
    let version = parse_hex_byte(parts[0])?;
    if version == INVALID_VERSION {
        return None;
    }
    // Version 00 is exactly four fields; later versions may append more.
    if version == SUPPORTED_VERSION && parts.len() != 4 {
        return None;
    }

    let trace_id = TraceId::from_hex(parts[1])?;
    let span_id = SpanId::from_hex(parts[2])?;

    if parts[3].len() != 2 {
        return None;
    }
    // Only the sampled bit is kept; `TraceFlags::new` clears the rest.
    let flags = parse_hex_byte(parts[3])?;

    let ctx = TraceContext::new(trace_id, span_id, TraceFlags::new(flags), TraceState::default());
    ctx.is_valid().then_some(ctx)
}

fn parse_hex_byte(field: &str) -> Option<u8> {
    if !field.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    u8::from_str_radix(field, 16).ok()
}
