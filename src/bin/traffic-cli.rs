use std::time::Duration;

use clap::{Parser, Subcommand};
use url::Url;

use tracelink::client::{DownstreamResponse, TracedClient};

#[derive(Parser)]
#[command(name = "traffic-cli")]
#[command(about = "Drive traffic against the user and post services and inspect exemplars", long_about = None)]
struct Cli {
    #[arg(long, default_value = "http://localhost:8080")]
    user_url: Url,

    #[arg(long, default_value = "http://localhost:8081")]
    post_url: Url,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a mix of ok, not-found, invalid, error and chained requests
    Generate {
        /// Number of rounds through the scenario mix
        #[arg(short, long, default_value_t = 1)]
        rounds: u32,
    },
    /// List exemplar-bearing lines from both services' /metrics
    Exemplars,
    /// Check both services' /health
    Health,
}

/// (service base, path with query, expected status)
const SCENARIOS: &[(Service, &str, u16)] = &[
    (Service::User, "/users?id=1", 200),
    (Service::User, "/users?id=999", 404),
    (Service::User, "/users?id=abc", 400),
    (Service::User, "/users", 400),
    (Service::User, "/error", 500),
    (Service::User, "/users/posts?id=1", 200),
    (Service::Post, "/posts?id=1", 200),
    (Service::Post, "/posts?id=999", 404),
    (Service::Post, "/posts/by-user?user_id=1", 200),
    (Service::Post, "/error", 503),
];

#[derive(Clone, Copy)]
enum Service {
    User,
    Post,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = TracedClient::new(Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Generate { rounds } => {
            let mut unexpected = 0;
            for round in 1..=rounds {
                println!("--- round {round} ---");
                for (service, path, expected) in SCENARIOS {
                    let base = match service {
                        Service::User => &cli.user_url,
                        Service::Post => &cli.post_url,
                    };
                    let url = base.join(path)?;
                    let response = client.inspect(url, None).await?;
                    if response.status.as_u16() != *expected {
                        unexpected += 1;
                    }
                    print_result(path, *expected, &response);
                }
            }
            if unexpected > 0 {
                eprintln!("{unexpected} responses had an unexpected status");
            }
        }
        Commands::Exemplars => {
            for base in [&cli.user_url, &cli.post_url] {
                let response = client.inspect(base.join("/metrics")?, None).await?;
                println!("# {base}");
                for line in response.body.lines().filter(|l| l.contains(" # {trace_id=")) {
                    println!("{line}");
                }
            }
        }
        Commands::Health => {
            for base in [&cli.user_url, &cli.post_url] {
                match client.inspect(base.join("/health")?, None).await {
                    Ok(response) => println!("{base} {} {}", response.status, response.body),
                    Err(e) => println!("{base} unreachable: {e}"),
                }
            }
        }
    }

    Ok(())
}

fn print_result(path: &str, expected: u16, response: &DownstreamResponse) {
    let trace_id = response
        .trace_context()
        .map(|ctx| ctx.trace_id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let marker = if response.status.as_u16() == expected { "ok" } else { "UNEXPECTED" };
    println!(
        "{:<28} {} (expected {expected}) trace_id={trace_id} [{marker}]",
        path,
        response.status.as_u16()
    );
}
