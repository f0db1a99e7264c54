//! Trace and span id generation.

use rand::Rng;

use crate::propagation::{SpanId, TraceId};

/// Source of fresh identifiers. Implementations must never return zero ids.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    fn new_trace_id(&self) -> TraceId;
    fn new_span_id(&self) -> SpanId;
}

/// Random ids from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        let mut rng = rand::thread_rng();
        loop {
            let id = TraceId::from_u128(rng.gen());
            if id.is_valid() {
                return id;
            }
        }
    }

    fn new_span_id(&self) -> SpanId {
        let mut rng = rand::thread_rng();
        loop {
            let id = SpanId::from_u64(rng.gen());
            if id.is_valid() {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_ids_are_valid_and_unique() {
        let generator = RandomIdGenerator;
        let mut trace_ids = HashSet::new();
        let mut span_ids = HashSet::new();

        for _ in 0..10_000 {
            assert!(trace_ids.insert(generator.new_trace_id()));
            assert!(span_ids.insert(generator.new_span_id()));
        }
        assert!(trace_ids.iter().all(TraceId::is_valid));
        assert!(span_ids.iter().all(SpanId::is_valid));
    }
}
