//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, timeout, transport tracing)
//!     → handlers/ (one per endpoint)
//!         → scope.rs (request span, in-flight guard)
//!         → store / downstream client
//!         → scope.rs (inject traceparent, record metrics, end span)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod scope;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use scope::RequestScope;
pub use server::{HttpServer, ServerError};
pub use state::AppState;
