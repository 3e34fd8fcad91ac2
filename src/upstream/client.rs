//! Snapshot client owning the single keep-alive connection to the camera.
//!
//! # Responsibilities
//! - Open the HTTP/1.1 connection lazily and keep it for later calls
//! - Send one GET per fetch with the precomputed headers
//! - Bound every fetch by the configured deadline
//! - Classify failures as timeout, transport or non-OK status
//!
//! # Design Decisions
//! - One connection behind a mutex: fetches never interleave on the wire
//! - Each fetch runs on a spawned task, a caller that goes away does not cut it short
//! - A connection that failed or timed out is dropped, the next fetch reconnects
//! - Non-OK bodies are drained so the connection stays reusable
//! - No retries: one fetch is one upstream attempt

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1::{self, SendRequest};
use hyper::header::HeaderMap;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::TimeoutConfig;
use crate::upstream::endpoint::{EndpointError, UpstreamEndpoint};
use crate::upstream::headers::build_headers;
use crate::upstream::outcome::{FetchFailure, FetchOutcome};

type Sender = SendRequest<Empty<Bytes>>;

/// Anything that can produce one snapshot per call.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = FetchOutcome> + Send;
}

impl<T: ImageSource> ImageSource for Arc<T> {
    fn fetch(&self) -> impl Future<Output = FetchOutcome> + Send {
        (**self).fetch()
    }
}

/// HTTP client for the configured camera.
///
/// Cheap to clone: clones share the same connection slot.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: UpstreamEndpoint,
    headers: HeaderMap,
    connect_timeout: Duration,
    request_timeout: Duration,
    connection: Mutex<Option<Sender>>,
}

impl UpstreamClient {
    /// Create a client. No connection is opened until the first fetch.
    pub fn new(endpoint: UpstreamEndpoint, timeouts: &TimeoutConfig) -> Result<Self, EndpointError> {
        let headers = build_headers(&endpoint)?;

        Ok(Self {
            inner: Arc::new(Inner {
                endpoint,
                headers,
                connect_timeout: Duration::from_millis(timeouts.connect_ms),
                request_timeout: Duration::from_millis(timeouts.request_ms),
                connection: Mutex::new(None),
            }),
        })
    }

    pub fn endpoint(&self) -> &UpstreamEndpoint {
        &self.inner.endpoint
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    /// Perform exactly one GET against the camera.
    ///
    /// The exchange runs on its own task: dropping the returned future does
    /// not abort a request already on the wire, so the connection survives
    /// callers that give up early.
    pub async fn fetch(&self) -> FetchOutcome {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.fetch().await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(FetchFailure::transport(format!(
                "fetch from camera at {} aborted: {}",
                self.inner.endpoint.authority(),
                e
            ))),
        }
    }
}

impl Inner {
    /// Waiting for the connection counts against the same deadline as the exchange.
    async fn fetch(&self) -> FetchOutcome {
        let exchange = async {
            let mut connection = self.connection.lock().await;
            self.round_trip(&mut connection).await
        };

        match timeout(self.request_timeout, exchange).await {
            Ok(outcome) => outcome,
            // The connection was taken out of the slot, dropping the future closed it.
            Err(_) => Err(FetchFailure::timeout(format!(
                "request to camera at {} timed out after {}ms",
                self.endpoint.authority(),
                self.request_timeout.as_millis()
            ))),
        }
    }

    async fn round_trip(&self, slot: &mut Option<Sender>) -> FetchOutcome {
        let mut sender = self.ready_sender(slot.take()).await?;

        let response = sender
            .send_request(self.build_request())
            .await
            .map_err(|e| self.classify(&e, "request to camera"))?;
        let status = response.status();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| self.classify(&e, "reading response from camera"))?
            .to_bytes();

        // Body fully consumed on every path, so the connection can be reused.
        *slot = Some(sender);

        if status != StatusCode::OK {
            return Err(FetchFailure::non_ok(
                status,
                format!(
                    "camera at {} responded with status {}",
                    self.endpoint.authority(),
                    status
                ),
            ));
        }

        Ok(body)
    }

    /// Reuse the cached connection if it is still usable, otherwise open a new one.
    async fn ready_sender(&self, cached: Option<Sender>) -> Result<Sender, FetchFailure> {
        if let Some(mut sender) = cached {
            if !sender.is_closed() && sender.ready().await.is_ok() {
                return Ok(sender);
            }
            tracing::debug!(
                camera = %self.endpoint.authority(),
                "Cached camera connection is closed, reconnecting"
            );
        }

        let mut sender = self.connect().await?;
        sender
            .ready()
            .await
            .map_err(|e| self.classify(&e, "camera connection"))?;
        Ok(sender)
    }

    async fn connect(&self) -> Result<Sender, FetchFailure> {
        let authority = self.endpoint.authority();

        let stream = match timeout(self.connect_timeout, TcpStream::connect(authority.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::TimedOut => {
                return Err(FetchFailure::timeout(format!(
                    "connecting to camera at {} timed out: {}",
                    authority, e
                )));
            }
            Ok(Err(e)) => {
                return Err(FetchFailure::transport(format!(
                    "could not connect to camera at {}: {}",
                    authority, e
                )));
            }
            Err(_) => {
                return Err(FetchFailure::timeout(format!(
                    "connecting to camera at {} timed out after {}ms",
                    authority,
                    self.connect_timeout.as_millis()
                )));
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::trace!(error = %e, "Failed to set TCP_NODELAY on camera connection");
        }

        let (sender, connection) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| self.classify(&e, "handshake with camera"))?;

        let camera = authority.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(camera = %camera, error = %e, "Camera connection ended with error");
            }
        });

        tracing::debug!(camera = %authority, "Connected to camera");
        Ok(sender)
    }

    fn build_request(&self) -> Request<Empty<Bytes>> {
        let mut request = Request::new(Empty::new());
        *request.uri_mut() = self.endpoint.request_uri().clone();
        *request.headers_mut() = self.headers.clone();
        request
    }

    fn classify(&self, error: &hyper::Error, during: &str) -> FetchFailure {
        let detail = format!(
            "{} at {} failed: {}",
            during,
            self.endpoint.authority(),
            error_chain(error)
        );
        if error.is_timeout() {
            FetchFailure::timeout(detail)
        } else {
            FetchFailure::transport(detail)
        }
    }
}

impl ImageSource for UpstreamClient {
    fn fetch(&self) -> impl Future<Output = FetchOutcome> + Send {
        UpstreamClient::fetch(self)
    }
}

/// Render an error together with its sources, e.g. "connection error: Connection reset by peer".
fn error_chain(error: &dyn StdError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
