//! Trace context propagation subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers (carrier)
//!     → traceparent.rs extract()  → Option<TraceContext>
//!     → trace::Tracer decides continue-or-root
//!
//! Outbound request / response headers (carrier)
//!     ← traceparent.rs inject()   ← active TraceContext
//! ```
//!
//! # Design Decisions
//! - W3C `traceparent` layout: `version-trace_id-span_id-flags`
//! - Extraction never fails loudly; a bad header is simply "no context"
//! - Injection is a pure write into the carrier, overwriting prior values
//! - Carriers are traits so the same code serves `HeaderMap` and plain maps

pub mod carrier;
pub mod context;
pub mod traceparent;

pub use carrier::{Extractor, Injector};
pub use context::{SpanId, TraceContext, TraceFlags, TraceId, TraceState};
pub use traceparent::{extract, inject, TRACEPARENT_HEADER, TRACESTATE_HEADER};
