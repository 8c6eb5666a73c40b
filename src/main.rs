//! Traffic-splitting HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http server ──▶ loopback resolver ──▶ router ──▶ predicates
//!                         │                 │  ▲                        (one random
//!                         │                 │  └── <loopback> ◀─┐        draw per
//!                         │                 ▼                   │        request)
//!                         │              filters ───────────────┘
//!                         │                 │
//!                         │                 ├──▶ tee duplicator ──▶ (detached) backend
//!                         ▼                 ▼
//!     Client Response ◀── shunt / transport ──▶ Backend Server
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use traffic_proxy::config::{load_config, ProxyConfig};
use traffic_proxy::observability::{logging, metrics};
use traffic_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "traffic-proxy")]
#[command(about = "HTTP proxy with weighted traffic segments, loopback and tee routes", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compile the route table, report rejected routes and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("traffic-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        max_loopbacks = config.routing.max_loopbacks,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();
    let metrics_enabled = config.observability.metrics_enabled;
    let metrics_address = config.observability.metrics_address.clone();

    let server = HttpServer::new(config);
    if cli.check {
        for err in server.rejected_routes() {
            eprintln!("rejected: {err}");
        }
        if server.rejected_routes().is_empty() {
            return Ok(());
        }
        return Err(format!("{} route(s) rejected", server.rejected_routes().len()).into());
    }

    if metrics_enabled {
        match metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(shutdown.clone().trigger_on_signal());

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
