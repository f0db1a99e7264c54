//! Per-request telemetry scope.
//!
//! # Responsibilities
//! - Start the request span from the inbound headers (continue or root)
//!   before any metric is recorded
//! - Hold the in-flight guard for the whole request
//! - Finalize in a fixed order: inject context into the response, record
//!   metrics, release the in-flight guard, end the span
//!
//! # Design Decisions
//! - Every handler goes through `RequestScope`, so the continue-or-root
//!   decision and the finalization order live in one place
//! - A scope dropped without `finish` (client disconnect, timeout) records
//!   a `cancelled` request with status 499

use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::instruments::set::{ATTR_ERROR_TYPE, ATTR_METHOD, ATTR_OUTCOME, ATTR_ROUTE, ATTR_STATUS};
use crate::instruments::{request_attributes, InFlightGuard, MetricAttributes, Outcome, ServiceInstruments};
use crate::propagation::{self, TraceContext};
use crate::trace::{ActiveSpan, Tracer};

/// Status recorded for requests abandoned before a response was produced.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

pub struct RequestScope {
    method: Method,
    route: &'static str,
    started: Instant,
    tracer: Tracer,
    instruments: Arc<ServiceInstruments>,
    in_flight: Option<InFlightGuard>,
    span: Option<ActiveSpan>,
    finished: bool,
}

impl RequestScope {
    /// Scope with a request span continued from, or rooted at, `headers`.
    pub fn traced(state: &AppState, method: &Method, route: &'static str, headers: &HeaderMap) -> Self {
        let mut span = state.tracer.start_from_carrier(format!("{method} {route}"), headers);
        span.set_attribute(ATTR_METHOD, method.as_str());
        span.set_attribute(ATTR_ROUTE, route);
        tracing::Span::current().record("trace_id", tracing::field::display(span.context().trace_id));
        tracing::debug!(
            trace_id = %span.context().trace_id,
            span_id = %span.context().span_id,
            origin = ?span.origin(),
            "Request span started"
        );

        let in_flight = state
            .instruments
            .track_in_flight(method.as_str(), route, Some(span.context()));
        Self::build(state, method, route, in_flight, Some(span))
    }

    /// Scope that records metrics only. Used for health checks.
    pub fn untraced(state: &AppState, method: &Method, route: &'static str) -> Self {
        let in_flight = state.instruments.track_in_flight(method.as_str(), route, None);
        Self::build(state, method, route, in_flight, None)
    }

    fn build(
        state: &AppState,
        method: &Method,
        route: &'static str,
        in_flight: InFlightGuard,
        span: Option<ActiveSpan>,
    ) -> Self {
        Self {
            method: method.clone(),
            route,
            started: Instant::now(),
            tracer: state.tracer.clone(),
            instruments: state.instruments.clone(),
            in_flight: Some(in_flight),
            span,
            finished: false,
        }
    }

    /// Context of the request span, if any.
    pub fn context(&self) -> Option<&TraceContext> {
        self.span.as_ref().map(ActiveSpan::context)
    }

    /// Internal span for a business operation under the request span.
    pub fn child_span(&self, name: &str) -> ActiveSpan {
        match self.context() {
            Some(parent) => self.tracer.start_child(name, parent),
            None => self.tracer.start_root(name),
        }
    }

    /// Turn the handler result into the response and finalize telemetry.
    pub fn finish(mut self, result: Result<Response, ApiError>) -> Response {
        let (mut response, outcome) = match result {
            Ok(response) => {
                let outcome = if response.status().is_success() { Outcome::Ok } else { Outcome::Error };
                (response, outcome)
            }
            Err(error) => {
                self.annotate_error(&error);
                let outcome = error.outcome();
                (error.into_response(), outcome)
            }
        };
        let status = response.status();

        if let Some(span) = self.span.as_mut() {
            span.set_attribute(ATTR_STATUS, status.as_u16());
            if outcome == Outcome::Ok {
                span.set_status_ok();
            }
            propagation::inject(span.context(), response.headers_mut());
        }

        self.record(status.as_u16(), outcome);
        self.finished = true;
        self.in_flight.take();
        if let Some(mut span) = self.span.take() {
            span.end();
        }

        tracing::debug!(status = status.as_u16(), outcome = %outcome, "Request finished");
        response
    }

    fn annotate_error(&mut self, error: &ApiError) {
        let span_error = error.span_error();
        if let Some(span) = self.span.as_mut() {
            match (&span_error, error) {
                (Some((description, error_type)), _) => span.record_error(description.clone(), error_type),
                (None, ApiError::MissingParameter(_) | ApiError::InvalidParameter(_)) => {
                    span.set_attribute("validation.error", error.to_string());
                }
                (None, _) => {}
            }
        }

        if let Some((description, error_type)) = span_error {
            let attributes = MetricAttributes::new()
                .with(ATTR_METHOD, self.method.as_str())
                .with(ATTR_ROUTE, self.route)
                .with(ATTR_STATUS, error.status().as_u16())
                .with(ATTR_ERROR_TYPE, error_type);
            self.instruments.record_error(&attributes, self.context());
            tracing::warn!(route = self.route, error_type, error = %description, "Request failed");
        }
    }

    fn record(&self, status: u16, outcome: Outcome) {
        let attributes = request_attributes(self.method.as_str(), self.route, status, outcome);
        self.instruments
            .record_request(&attributes, self.started.elapsed(), self.context());
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(ATTR_OUTCOME, Outcome::Cancelled.as_str());
            span.set_attribute(ATTR_STATUS, CLIENT_CLOSED_REQUEST);
        }
        self.record(CLIENT_CLOSED_REQUEST, Outcome::Cancelled);
        tracing::debug!(route = self.route, "Request cancelled before completion");

        self.in_flight.take();
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }
}

/// 200 with a JSON body.
pub(crate) fn ok_json<T: serde::Serialize>(value: &T) -> Response {
    (StatusCode::OK, axum::Json(value)).into_response()
}
