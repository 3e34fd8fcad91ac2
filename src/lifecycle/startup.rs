//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Build the gRPC server (camera client and handler)
//! - Bind the listener and serve until shutdown

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::grpc::{GrpcServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::upstream::EndpointError;

/// Fatal errors before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid camera endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Run the gateway with an already validated config until `shutdown` fires.
pub async fn run(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let observability = &config.observability;
    if observability.metrics_enabled {
        let addr: SocketAddr = observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address(observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = GrpcServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
