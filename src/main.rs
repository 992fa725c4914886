//! Social dashboard API gateway.
//!
//! ```text
//!   Browser ──▶ ┌───────────────────────────────────────────┐
//!               │ http (axum, request ID, trace, timeout)   │
//!               │   └─▶ gateway (validate → forward once)   │ ──▶ analytics service
//!               │         └─▶ upstream (reqwest)            │ ──▶ automation service
//!   Browser ◀── │   ◀── envelope {status, body}             │ ──▶ AI generator
//!               └───────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use social_gateway::config::{load_config, load_from_env};
use social_gateway::observability::{init_logging, init_metrics};
use social_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "social-gateway")]
#[command(about = "API gateway for the social dashboard", long_about = None)]
struct Args {
    /// TOML configuration file. Without it, defaults plus GATEWAY_* variables are used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "social-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
