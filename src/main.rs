//! Analytics route service
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                 ROUTE SERVICE                     │
//!   Platform router        │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   (X-Cf-Forwarded-Url) ──┼─▶│  http   │───▶│ director │───▶│  upstream   │──┼──▶ Destination
//!                          │  │ server  │    │          │    │  client     │  │
//!   ◀──────────────────────┼──│         │◀───┼──────────┼────│             │◀─┼───
//!                          │  └─────────┘    └────┬─────┘    └─────────────┘  │
//!                          │                      │ resource type resolver    │
//!                          │                      ▼                           │
//!                          │               ┌──────────────┐                   │
//!                          │               │  analytics   │ (spawned task)  ──┼──▶ Collector
//!                          │               │   emitter    │                   │
//!                          │               └──────────────┘                   │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use analytics_route_service::config;
use analytics_route_service::lifecycle::startup;
use analytics_route_service::observability::logging;

#[derive(Parser)]
#[command(name = "analytics-route-service")]
#[command(about = "Route service that reports resource-type analytics for proxied requests", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding PORT and the config file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        forwarding_header = %config.forwarding.header,
        skip_tls_verification = config.forwarding.skip_tls_verification,
        collect_url = %config.analytics.collect_url,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
