//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use image_feed_gateway::config::GatewayConfig;
use image_feed_gateway::proto::image_feed_service_client::ImageFeedServiceClient;
use image_feed_gateway::{GrpcServer, Shutdown};

/// What the stub camera does with the n-th request it receives.
pub enum Reply {
    /// Respond with this status and body, keeping the connection open.
    Respond(u16, Vec<u8>),
    /// Wait, then respond and keep the connection open.
    Delayed(Duration, u16, Vec<u8>),
    /// Respond without `Connection: close`, then drop the idle connection.
    RespondThenClose(u16, Vec<u8>),
    /// Hold the connection without answering, then drop it.
    Stall(Duration),
}

/// A request line plus headers as seen by the stub camera.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct StubState {
    requests: Mutex<Vec<SeenRequest>>,
    connections: AtomicUsize,
}

/// Programmable HTTP/1.1 camera that honours keep-alive.
pub struct StubCamera {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubCamera {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(StubState::default());
        let responder = Arc::new(responder);

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accept_state.connections.fetch_add(1, Ordering::SeqCst);
                let state = accept_state.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    serve_connection(socket, state, responder).await;
                });
            }
        });

        Self { addr, state }
    }

    /// Always answer 200 with `body`.
    pub async fn serving(body: Vec<u8>) -> Self {
        Self::start(move |_| Reply::Respond(200, body.clone())).await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }
}

async fn serve_connection<F>(socket: TcpStream, state: Arc<StubState>, responder: Arc<F>)
where
    F: Fn(usize) -> Reply + Send + Sync + 'static,
{
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);

    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        let mut parts = request_line.split_whitespace();
        let seen = SeenRequest {
            method: parts.next().unwrap_or_default().to_string(),
            target: parts.next().unwrap_or_default().to_string(),
            headers,
        };
        let index = {
            let mut requests = state.requests.lock().unwrap();
            requests.push(seen);
            requests.len() - 1
        };

        match responder(index) {
            Reply::Respond(status, body) => {
                if write_response(&mut write, status, &body).await.is_err() {
                    return;
                }
            }
            Reply::Delayed(delay, status, body) => {
                tokio::time::sleep(delay).await;
                if write_response(&mut write, status, &body).await.is_err() {
                    return;
                }
            }
            Reply::RespondThenClose(status, body) => {
                let _ = write_response(&mut write, status, &body).await;
                return;
            }
            Reply::Stall(duration) => {
                tokio::time::sleep(duration).await;
                return;
            }
        }
    }
}

async fn write_response<W>(write: &mut W, status: u16, body: &[u8]) -> std::io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        status,
        reason(status),
        body.len()
    );
    write.write_all(head.as_bytes()).await?;
    write.write_all(body).await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Deterministic JPEG-looking payload of exactly `len` bytes.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    assert!(len >= 4);
    let mut data: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
    data[0] = 0xFF;
    data[1] = 0xD8;
    data[len - 2] = 0xFF;
    data[len - 1] = 0xD9;
    data
}

/// Payload unique to request `index`: 8-byte index header, then filler of index-dependent length.
pub fn numbered_frame(index: usize) -> Vec<u8> {
    let mut data = (index as u64).to_be_bytes().to_vec();
    data.extend(std::iter::repeat(index as u8).take(4_096 + index * 131));
    data
}

/// Config pointing at `camera` with short test timeouts.
pub fn config_for(camera: SocketAddr, path: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.address = camera.to_string();
    config.upstream.request_path = path.into();
    config.timeouts.connect_ms = 1_000;
    config.timeouts.request_ms = 2_000;
    config
}

/// Start a gateway on an ephemeral port and return a connected client.
pub async fn start_gateway(
    config: GatewayConfig,
) -> (ImageFeedServiceClient<tonic::transport::Channel>, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GrpcServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = ImageFeedServiceClient::connect(format!("http://{}", addr))
        .await
        .unwrap();
    (client, shutdown)
}
