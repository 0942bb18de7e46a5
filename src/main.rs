//! Edge gateway binary.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                       EDGE GATEWAY                        │
//!   Client ──────▶│  request-id → trace → metrics → timeout → auth context    │
//!                 │        → validated handler → adapter → BaseApiClient      │
//!                 │                                   │                       │
//!                 │                 ┌─────────────────▼─────────────────┐     │
//!                 │                 │ ResilientTransport (per upstream) │     │
//!                 │                 │ Retry → CircuitBreaker → hyper    │     │
//!                 │                 └─────────────────┬─────────────────┘     │
//!   Client ◀──────│  envelope {code,status,message,data}, HTTP status = code  │
//!                 └───────────────────────────────────┼──────────────────────┘
//!                                                     ▼
//!                              account · crm · logistics · purchase · task
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use edge_gateway::config::load_or_default;
use edge_gateway::lifecycle::{signals, Shutdown};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::{HttpServer, Upstreams};

#[derive(Debug, Parser)]
#[command(name = "edge-gateway", version, about = "Edge HTTP gateway over the internal services")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");

    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );
    for (name, upstream) in config.upstreams.iter() {
        tracing::info!(
            upstream = name,
            base_url = %upstream.base_url(),
            max_failures = upstream.breaker.max_failures,
            max_retries = upstream.retry.max_retries,
            "Upstream configured"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let upstreams = Upstreams::from_config(&config.upstreams)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    HttpServer::new(config, upstreams).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
