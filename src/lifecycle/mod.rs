//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Logging → Metrics → Telemetry → Store → Listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Flush telemetry → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then telemetry, then listeners
//! - Ordered shutdown: stop accept, drain, flush telemetry last so spans of
//!   drained requests are exported

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{forward_signals, shutdown_signal};
