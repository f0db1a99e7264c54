//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use tracelink::config::{ServiceConfig, ServiceKind};
use tracelink::export::MemorySink;
use tracelink::instruments::{MetricSample, ServiceInstruments};
use tracelink::lifecycle::Shutdown;
use tracelink::store::{InMemoryStore, Post, RecordStore, StoreError, User};
use tracelink::trace::SpanData;
use tracelink::{HttpServer, Telemetry};

/// A service running on an ephemeral port, exporting into memory.
pub struct TestService {
    pub addr: SocketAddr,
    pub sink: MemorySink,
    pub telemetry: Telemetry,
    shutdown: Shutdown,
    join: JoinHandle<Result<(), std::io::Error>>,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn instruments(&self) -> &Arc<ServiceInstruments> {
        self.telemetry.instruments()
    }

    /// Export everything recorded so far and return all exported spans.
    pub async fn spans(&self) -> Vec<SpanData> {
        assert!(self.telemetry.force_flush().await, "exporter stopped");
        self.sink.spans()
    }

    /// Export everything recorded so far and return all exported samples.
    pub async fn samples(&self) -> Vec<MetricSample> {
        assert!(self.telemetry.force_flush().await, "exporter stopped");
        self.sink.samples()
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.join.await;
        self.telemetry.stop().await;
    }
}

/// Start a service of `kind` backed by `store`. `tweak` adjusts the config
/// after test defaults are applied.
pub async fn spawn_service(
    kind: ServiceKind,
    store: Arc<dyn RecordStore>,
    tweak: impl FnOnce(&mut ServiceConfig),
) -> TestService {
    let mut config = ServiceConfig::for_kind(kind);
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config.telemetry.flush_interval_ms = 50;
    tweak(&mut config);

    let sink = MemorySink::new();
    let telemetry = Telemetry::start(&config.service, &config.telemetry, sink.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, &telemetry, store).unwrap();

    let shutdown = Shutdown::new();
    let join = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestService {
        addr,
        sink,
        telemetry,
        shutdown,
        join,
    }
}

pub async fn spawn_user_service() -> TestService {
    spawn_service(ServiceKind::User, Arc::new(InMemoryStore::seeded()), |_| {}).await
}

pub async fn spawn_post_service() -> TestService {
    spawn_service(ServiceKind::Post, Arc::new(InMemoryStore::seeded()), |_| {}).await
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Samples of `instrument` for `route`.
pub fn samples_for<'a>(samples: &'a [MetricSample], instrument: &str, route: &str) -> Vec<&'a MetricSample> {
    samples
        .iter()
        .filter(|s| s.instrument_name == instrument && s.attributes.get("http.route") == Some(route))
        .collect()
}

pub fn span_named<'a>(spans: &'a [SpanData], name: &str) -> Option<&'a SpanData> {
    spans.iter().find(|s| s.name == name)
}

/// A store whose lookups take `delay` before answering from seeded data.
pub struct SlowStore {
    pub delay: Duration,
    inner: InMemoryStore,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: InMemoryStore::seeded(),
        }
    }
}

impl RecordStore for SlowStore {
    fn user_by_id(&self, id: i64) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        async move {
            tokio::time::sleep(self.delay).await;
            self.inner.user_by_id(id).await
        }
        .boxed()
    }

    fn post_by_id(&self, id: i64) -> BoxFuture<'_, Result<Option<Post>, StoreError>> {
        async move {
            tokio::time::sleep(self.delay).await;
            self.inner.post_by_id(id).await
        }
        .boxed()
    }

    fn posts_by_user(&self, user_id: i64) -> BoxFuture<'_, Result<Vec<Post>, StoreError>> {
        async move {
            tokio::time::sleep(self.delay).await;
            self.inner.posts_by_user(user_id).await
        }
        .boxed()
    }
}

/// A store that is always down.
pub struct FailingStore;

impl RecordStore for FailingStore {
    fn user_by_id(&self, _id: i64) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        futures_util::future::ready(Err(StoreError::Unavailable("connection refused".to_string()))).boxed()
    }

    fn post_by_id(&self, _id: i64) -> BoxFuture<'_, Result<Option<Post>, StoreError>> {
        futures_util::future::ready(Err(StoreError::Unavailable("connection refused".to_string()))).boxed()
    }

    fn posts_by_user(&self, _user_id: i64) -> BoxFuture<'_, Result<Vec<Post>, StoreError>> {
        futures_util::future::ready(Err(StoreError::Partial {
            rows_read: 1,
            message: "connection reset".to_string(),
        }))
        .boxed()
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
