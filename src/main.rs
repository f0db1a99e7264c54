use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use tracelink::config::{self, ServiceConfig, ServiceKind};
use tracelink::export::ConfiguredSink;
use tracelink::lifecycle::{self, Shutdown};
use tracelink::observability::{logging, metrics, Telemetry};
use tracelink::store::InMemoryStore;
use tracelink::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "tracelink", version, about = "User or post service with trace propagation and exemplars")]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which service to run; overrides `service.kind`.
    #[arg(short, long, value_enum)]
    service: Option<ServiceKind>,

    /// Overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Overrides `downstream.post_service_url`.
    #[arg(long)]
    post_service_url: Option<String>,
}

fn load(args: &Args) -> Result<ServiceConfig, config::ConfigError> {
    let overrides = config::ConfigOverrides {
        kind: args.service,
        bind_address: args.bind.clone(),
        post_service_url: args.post_service_url.clone(),
    };
    config::resolve_config(args.config.as_deref(), &overrides)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load(&args)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let sink = ConfiguredSink::from_config(&config.telemetry)?;
    let telemetry = Telemetry::start(&config.service, &config.telemetry, sink);

    let store = Arc::new(InMemoryStore::seeded());
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, &telemetry, store)?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signals = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { lifecycle::forward_signals(&shutdown).await })
    };

    let served = server.run(listener, server_shutdown).await;
    signals.abort();

    telemetry.stop().await;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
