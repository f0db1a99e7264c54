//! Outbound HTTP with trace context propagation.
//!
//! # Data Flow
//! ```text
//! caller context ──inject──▶ request headers ──▶ downstream service
//!                                                  │ extract → ContinuedSpan
//! response status/headers/body ◀───────────────────┘
//! ```
//!
//! # Design Decisions
//! - Status >= 400 is an error for `get_json`; `inspect` never raises on status
//! - The client never creates spans; the caller owns the span being propagated

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::propagation::{self, TraceContext};

/// Errors from a downstream call.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The request could not be sent or the response not read.
    #[error("downstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The downstream service answered with status >= 400.
    #[error("downstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The body was not the expected JSON.
    #[error("downstream response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DownstreamError {
    pub fn kind(&self) -> &'static str {
        match self {
            DownstreamError::Transport(_) => "downstream_transport",
            DownstreamError::Status { .. } => "downstream_status",
            DownstreamError::Decode(_) => "downstream_decode",
        }
    }
}

/// A raw downstream response.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl DownstreamResponse {
    /// Trace context the downstream service injected into its response.
    pub fn trace_context(&self) -> Option<TraceContext> {
        propagation::extract(&self.headers)
    }

    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }
}

/// HTTP client that injects the caller's trace context into every request.
#[derive(Debug, Clone)]
pub struct TracedClient {
    http: reqwest::Client,
}

impl TracedClient {
    pub fn new(timeout: Duration) -> Result<Self, DownstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// GET `url` and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url, context: Option<&TraceContext>) -> Result<T, DownstreamError> {
        let response = self.inspect(url, context).await?;
        if response.is_error() {
            return Err(DownstreamError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// GET `url` and return the response whatever its status.
    pub async fn inspect(&self, url: Url, context: Option<&TraceContext>) -> Result<DownstreamResponse, DownstreamError> {
        let mut headers = HeaderMap::new();
        if let Some(ctx) = context {
            propagation::inject(ctx, &mut headers);
        }

        tracing::debug!(url = %url, traced = context.is_some(), "Downstream request");
        let response = self.http.get(url).headers(headers).send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(DownstreamResponse { status, headers, body })
    }
}
