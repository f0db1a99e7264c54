use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use crate::propagation::{SpanId, TraceContext, TraceId};
use crate::trace::now_unix_nanos;

/// A measurement linked to the span that was active when it was taken.
///
/// Holds copies of the identifiers only, so it never keeps a span alive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exemplar {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub value: f64,
    pub recorded_at_unix_nano: u64,
}

impl Exemplar {
    /// `None` unless `context` is valid.
    pub fn from_context(context: &TraceContext, value: f64) -> Option<Self> {
        if !context.is_valid() {
            return None;
        }
        Some(Self {
            trace_id: context.trace_id,
            span_id: context.span_id,
            value,
            recorded_at_unix_nano: now_unix_nanos(),
        })
    }
}

/// Latest-wins exemplar storage for one series or bucket.
#[derive(Debug, Default)]
pub struct ExemplarSlot(ArcSwapOption<Exemplar>);

impl ExemplarSlot {
    pub fn store(&self, exemplar: Exemplar) {
        self.0.store(Some(Arc::new(exemplar)));
    }

    pub fn load(&self) -> Option<Exemplar> {
        self.0.load_full().map(|e| (*e).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{TraceFlags, TraceState};

    #[test]
    fn test_exemplar_requires_valid_context() {
        let valid = TraceContext::new(
            TraceId::from_u128(7),
            SpanId::from_u64(9),
            TraceFlags::SAMPLED,
            TraceState::default(),
        );
        let invalid = TraceContext::new(TraceId::INVALID, SpanId::from_u64(9), TraceFlags::SAMPLED, TraceState::default());

        let exemplar = Exemplar::from_context(&valid, 0.25).unwrap();
        assert_eq!(exemplar.trace_id, valid.trace_id);
        assert_eq!(exemplar.span_id, valid.span_id);
        assert!(Exemplar::from_context(&invalid, 0.25).is_none());
    }

    #[test]
    fn test_slot_keeps_latest() {
        let slot = ExemplarSlot::default();
        assert!(slot.load().is_none());

        let ctx = TraceContext::new(TraceId::from_u128(1), SpanId::from_u64(1), TraceFlags::SAMPLED, TraceState::default());
        slot.store(Exemplar::from_context(&ctx, 1.0).unwrap());
        slot.store(Exemplar::from_context(&ctx.with_span_id(SpanId::from_u64(2)), 2.0).unwrap());

        let latest = slot.load().unwrap();
        assert_eq!(latest.span_id, SpanId::from_u64(2));
        assert_eq!(latest.value, 2.0);
    }
}
