//! gRPC server setup and configuration.
//!
//! # Responsibilities
//! - Build the camera client and call handler from config
//! - Register `ImageFeedService` and server reflection
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener until shutdown

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::grpc::handler::CallHandler;
use crate::observability::{CallEvents, TracingEvents};
use crate::proto::image_feed_service_server::ImageFeedServiceServer;
use crate::proto::FILE_DESCRIPTOR_SET;
use crate::upstream::{EndpointError, UpstreamClient, UpstreamEndpoint};

/// Error type for a running server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// gRPC server for the image feed.
pub struct GrpcServer {
    config: GatewayConfig,
    handler: CallHandler<UpstreamClient>,
}

impl GrpcServer {
    /// Create a server that reports call outcomes through tracing and metrics.
    pub fn new(config: GatewayConfig) -> Result<Self, EndpointError> {
        Self::with_events(config, Arc::new(TracingEvents))
    }

    /// Create a server with a custom call event sink.
    pub fn with_events(config: GatewayConfig, events: Arc<dyn CallEvents>) -> Result<Self, EndpointError> {
        let upstream = &config.upstream;
        let endpoint = UpstreamEndpoint::from_config(upstream)?;

        if endpoint.credentials().is_none() && (upstream.username.is_some() || upstream.password.is_some()) {
            tracing::warn!("Camera username or password is empty, requests are sent without Authorization");
        }

        let client = UpstreamClient::new(endpoint, &config.timeouts)?;
        Ok(Self {
            handler: CallHandler::new(client, events),
            config,
        })
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;

        let reflection_v1 = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        let reflection_v1alpha = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1alpha()?;

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_grpc())
            .layer(PropagateRequestIdLayer::x_request_id())
            .into_inner();

        let endpoint = self.handler.source().endpoint();
        tracing::info!(
            address = %addr,
            camera = %endpoint.authority(),
            request_path = %endpoint.request_uri(),
            authenticated = endpoint.credentials().is_some(),
            timeout_ms = self.handler.source().request_timeout().as_millis() as u64,
            "gRPC server starting"
        );

        Server::builder()
            .max_concurrent_streams(Some(self.config.listener.max_concurrent_streams))
            .layer(middleware)
            .add_service(ImageFeedServiceServer::new(self.handler))
            .add_service(reflection_v1)
            .add_service(reflection_v1alpha)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining calls");
            })
            .await?;

        tracing::info!("gRPC server stopped");
        Ok(())
    }
}
