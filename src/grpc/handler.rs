//! Per-call entry point for `ImageFeedService/Get`.

use std::sync::Arc;
use std::time::Instant;

use tonic::{Code, Request, Response, Status};
use tracing::Instrument;

use crate::observability::CallEvents;
use crate::proto::image_feed_service_server::ImageFeedService;
use crate::proto::{Empty, Image};
use crate::upstream::{FailureKind, FetchFailure, ImageSource};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Map a fetch failure to the status returned to the caller.
///
/// Unreachable camera → `UNAVAILABLE`, non-OK camera status → `CANCELLED`.
pub fn status_for(failure: &FetchFailure) -> Status {
    let code = match failure.kind() {
        FailureKind::Timeout | FailureKind::Transport => Code::Unavailable,
        FailureKind::NonOkStatus(_) => Code::Cancelled,
    };
    Status::new(code, failure.detail())
}

/// Stateless adapter from one gRPC call to one upstream fetch.
pub struct CallHandler<S> {
    source: S,
    events: Arc<dyn CallEvents>,
}

impl<S: ImageSource> CallHandler<S> {
    pub fn new(source: S, events: Arc<dyn CallEvents>) -> Self {
        Self { source, events }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch once and translate the outcome.
    pub async fn handle(&self) -> Result<Image, Status> {
        let started = Instant::now();

        match self.source.fetch().await {
            Ok(data) => {
                self.events.image_served(data.len(), started.elapsed());
                Ok(Image { data })
            }
            Err(failure) => {
                if failure.is_unreachable() {
                    self.events.upstream_unavailable(&failure, started.elapsed());
                } else {
                    self.events.upstream_rejected(&failure, started.elapsed());
                }
                Err(status_for(&failure))
            }
        }
    }
}

#[tonic::async_trait]
impl<S: ImageSource> ImageFeedService for CallHandler<S> {
    async fn get(&self, request: Request<Empty>) -> Result<Response<Image>, Status> {
        let request_id = request
            .metadata()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let span = tracing::info_span!("get_image", request_id = %request_id);
        self.handle().instrument(span).await.map(Response::new)
    }
}
