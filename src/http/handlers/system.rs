//! Health, deliberate-error and scrape endpoints shared by both services.

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::config::ServiceKind;
use crate::http::error::ApiError;
use crate::http::scope::{ok_json, RequestScope};
use crate::http::state::AppState;
use crate::instruments::OPENMETRICS_CONTENT_TYPE;

/// `GET /health`. Counted in the request metrics but never traced.
pub async fn health(State(state): State<AppState>, method: Method) -> Response {
    let scope = RequestScope::untraced(&state, &method, "/health");
    let body = json!({ "status": "ok", "service": &*state.service_name });
    scope.finish(Ok(ok_json(&body)))
}

/// `GET /error`. Always fails, for checking error telemetry end to end.
pub async fn error(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    let scope = RequestScope::traced(&state, &method, "/error", &headers);
    scope.finish(Err(simulated_error(state.kind)))
}

fn simulated_error(kind: ServiceKind) -> ApiError {
    match kind {
        ServiceKind::User => ApiError::Simulated {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description: "Intentional test error",
            error_type: "test_error",
            body: "This is a test error endpoint",
        },
        ServiceKind::Post => ApiError::Simulated {
            status: StatusCode::SERVICE_UNAVAILABLE,
            description: "Database connection failed",
            error_type: "database_error",
            body: "Database temporarily unavailable",
        },
    }
}

/// `GET /metrics`. OpenMetrics text with exemplars.
pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)],
        state.instruments.render_openmetrics(),
    )
        .into_response()
}
