//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the endpoints of the configured service kind
//! - Wire up middleware (timeout, request ID, transport-level tracing)
//! - Bind server to listener and stop on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::client::{DownstreamError, TracedClient};
use crate::config::{ServiceConfig, ServiceKind};
use crate::http::handlers::{posts, system, users};
use crate::http::state::AppState;
use crate::observability::Telemetry;
use crate::store::RecordStore;

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid downstream URL '{url}': {source}")]
    InvalidUrl { url: String, source: url::ParseError },

    #[error("failed to build downstream client: {0}")]
    Client(#[from] DownstreamError),
}

/// HTTP server for a user or post service.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig, telemetry: &Telemetry, store: Arc<dyn RecordStore>) -> Result<Self, ServerError> {
        let client = TracedClient::new(Duration::from_secs(config.timeouts.downstream_secs))?;

        let posts_by_user_url = match (config.service.kind, &config.downstream.post_service_url) {
            (ServiceKind::User, Some(base)) => {
                let url = Url::parse(base)
                    .and_then(|base| base.join("/posts/by-user"))
                    .map_err(|source| ServerError::InvalidUrl {
                        url: base.clone(),
                        source,
                    })?;
                Some(url)
            }
            _ => None,
        };

        let state = AppState {
            kind: config.service.kind,
            service_name: Arc::from(config.service.name.as_str()),
            tracer: telemetry.tracer().clone(),
            instruments: Arc::clone(telemetry.instruments()),
            store,
            client,
            posts_by_user_url,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let routes = match state.kind {
            ServiceKind::User => {
                let mut routes = Router::new().route("/users", get(users::get_user));
                if state.posts_by_user_url.is_some() {
                    routes = routes.route("/users/posts", get(users::get_user_posts));
                }
                routes
            }
            ServiceKind::Post => Router::new()
                .route("/posts", get(posts::get_post))
                .route("/posts/by-user", get(posts::get_posts_by_user)),
        };

        routes
            .route("/health", get(system::health))
            .route("/error", get(system::error))
            .route("/metrics", get(system::metrics))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                    trace_id = tracing::field::Empty,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for serving on a custom listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown broadcast is received.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            kind = ?self.config.service.kind,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use crate::store::InMemoryStore;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn server(kind: ServiceKind, tweak: impl FnOnce(&mut ServiceConfig)) -> (HttpServer, Telemetry) {
        let mut config = ServiceConfig::for_kind(kind);
        tweak(&mut config);
        let telemetry = Telemetry::start(&config.service, &config.telemetry, MemorySink::new());
        let server = HttpServer::new(config, &telemetry, Arc::new(InMemoryStore::seeded())).unwrap();
        (server, telemetry)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_routes_follow_service_kind() {
        let (users, _telemetry) = server(ServiceKind::User, |_| {});
        let response = users.router().oneshot(get("/users?id=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("traceparent"));
        assert!(response.headers().contains_key("x-request-id"));

        let response = users.router().oneshot(get("/posts?id=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (posts, _telemetry) = server(ServiceKind::Post, |_| {});
        let response = posts.router().oneshot(get("/posts?id=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = posts.router().oneshot(get("/users/posts?id=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chained_route_needs_downstream_url() {
        let (users, _telemetry) = server(ServiceKind::User, |c| c.downstream.post_service_url = None);
        let response = users.router().oneshot(get("/users/posts?id=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_downstream_url_is_rejected() {
        let mut config = ServiceConfig::for_kind(ServiceKind::User);
        config.downstream.post_service_url = Some("not a url".to_string());
        let telemetry = Telemetry::start(&config.service, &config.telemetry, MemorySink::new());
        let result = HttpServer::new(config, &telemetry, Arc::new(InMemoryStore::seeded()));
        assert!(matches!(result, Err(ServerError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_metrics_route_serves_openmetrics() {
        let (posts, telemetry) = server(ServiceKind::Post, |_| {});
        posts.router().oneshot(get("/posts?id=2")).await.unwrap();

        let response = posts.router().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            crate::instruments::OPENMETRICS_CONTENT_TYPE
        );
        assert_eq!(telemetry.instruments().requests().total(), 1);
    }
}
