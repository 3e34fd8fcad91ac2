//! Image feed gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │               IMAGE FEED GATEWAY               │
//!                      │                                                │
//!    gRPC Get(Empty)   │  ┌──────────┐   ┌─────────────┐   ┌─────────┐  │   HTTP GET
//!   ───────────────────┼─▶│  grpc    │──▶│ CallHandler │──▶│upstream │──┼──────────▶ Camera
//!                      │  │ server   │   │             │   │ client  │  │
//!    Image / Status    │  └──────────┘   └─────────────┘   └─────────┘  │   JPEG bytes
//!   ◀──────────────────┼───────────────────────────────────────────────◀┼──────────
//!                      │                                                │
//!                      │   config · observability · lifecycle           │
//!                      └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use image_feed_gateway::config::{load_config, ConfigError, ObservabilityConfig};
use image_feed_gateway::lifecycle::{self, Shutdown};
use image_feed_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "image-feed-gateway")]
#[command(about = "Serve camera snapshots over gRPC", long_about = None)]
struct Cli {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long, env = "FEED_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_deref());

    let observability = match &loaded {
        Ok(config) => config.observability.clone(),
        Err(_) => ObservabilityConfig::default(),
    };
    if let Err(e) = logging::init(&observability) {
        eprintln!("failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("image-feed-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                tracing::error!(%error, "Invalid configuration");
            }
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        camera = %config.upstream.address,
        request_path = %config.upstream.request_path,
        request_timeout_ms = config.timeouts.request_ms,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    match lifecycle::run(config, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            ExitCode::FAILURE
        }
    }
}
