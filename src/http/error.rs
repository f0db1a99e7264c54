//! Handler error taxonomy and its mapping to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::client::DownstreamError;
use crate::instruments::Outcome;
use crate::store::StoreError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter is absent or empty.
    #[error("{0} is required")]
    MissingParameter(&'static str),

    /// A query parameter is not an integer.
    #[error("invalid {0}")]
    InvalidParameter(&'static str),

    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),

    /// A deliberate failure served by the error endpoints.
    #[error("{description}")]
    Simulated {
        status: StatusCode,
        description: &'static str,
        error_type: &'static str,
        body: &'static str,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Downstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Simulated { status, .. } => *status,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidParameter(_) => Outcome::Invalid,
            ApiError::NotFound(_) => Outcome::NotFound,
            ApiError::Store(_) | ApiError::Downstream(_) | ApiError::Simulated { .. } => Outcome::Error,
        }
    }

    /// Description and `error.type` for failures that mark the span as an error.
    ///
    /// Input errors and missing records are expected outcomes and return `None`.
    pub fn span_error(&self) -> Option<(String, &'static str)> {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidParameter(_) | ApiError::NotFound(_) => None,
            ApiError::Store(e) => Some((e.to_string(), e.kind())),
            ApiError::Downstream(e) => Some((e.to_string(), e.kind())),
            ApiError::Simulated {
                description, error_type, ..
            } => Some((description.to_string(), *error_type)),
        }
    }

    /// Client-facing body. Collaborator details are never exposed.
    pub fn body(&self) -> String {
        match self {
            ApiError::Store(_) => "internal server error".to_string(),
            ApiError::Downstream(_) => "downstream service error".to_string(),
            ApiError::Simulated { body, .. } => body.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}
