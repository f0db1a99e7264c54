//! Span lifecycle management.
//!
//! # State Machine
//! ```text
//! NoContext ──extract() = None──▶ RootSpan      ──┐
//!     │                                           ├──end()──▶ Ended
//!     └──────extract() = Some──▶ ContinuedSpan ──┘
//! ```
//!
//! # Responsibilities
//! - Decide continue-vs-root once, in `Tracer::start_from_carrier`
//! - Own each span through `ActiveSpan`, which ends it exactly once
//! - Hand ended spans to the export queue
//!
//! # Design Decisions
//! - No global tracer; a `Tracer` is built by the telemetry context and
//!   passed to handlers
//! - Ending is tied to `Drop`, so early returns, `?`, panics and cancelled
//!   futures all end the span
//! - Mutations after end are silently ignored

pub mod active;
pub mod id;
pub mod span;
pub mod tracer;

pub use active::ActiveSpan;
pub use id::{IdGenerator, RandomIdGenerator};
pub use span::{now_unix_nanos, AttributeValue, Attributes, SpanData, SpanEvent, SpanKind, SpanStatus};
pub use tracer::{SpanOrigin, Tracer};
