//! Shared utilities for the gateway integration tests.
//!
//! The mock backend speaks just enough HTTP/1.1 over a raw `TcpListener` to
//! record what the gateway sent and answer with a scripted response.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use edge_gateway::config::{GatewayConfig, UpstreamConfig};
use edge_gateway::{HttpServer, Upstreams};

/// One request as the backend received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path and query, exactly as sent on the request line.
    pub target: String,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a backend that answers every request with `status` and `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockBackend {
    start_programmable_backend(move |_| (status, body.to_string())).await
}

/// Start a backend whose answer depends on the zero-based call index.
pub async fn start_programmable_backend<F>(respond: F) -> MockBackend
where
    F: Fn(usize) -> (u16, String) + Send + Sync + 'static,
{
    start_delayed_backend(Duration::ZERO, respond).await
}

/// Like [`start_programmable_backend`], but waits `delay` before answering.
pub async fn start_delayed_backend<F>(delay: Duration, respond: F) -> MockBackend
where
    F: Fn(usize) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            let respond = respond.clone();
            tokio::spawn(async move {
                serve_connection(socket, delay, recorded, respond).await;
            });
        }
    });

    MockBackend { addr, requests }
}

async fn serve_connection<F>(
    mut socket: TcpStream,
    delay: Duration,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    respond: Arc<F>,
) where
    F: Fn(usize) -> (u16, String) + Send + Sync + 'static,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };

    let index = {
        let mut requests = recorded.lock().unwrap();
        requests.push(request);
        requests.len() - 1
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = respond(index);
    let reason = http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Recorded {
        method,
        target,
        headers,
        body,
    })
}

/// A config with every upstream pointed at `backend`, fast retries and a
/// short breaker reset so tests stay quick.
pub fn gateway_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.observability.metrics_enabled = false;

    let point = |upstream: &mut UpstreamConfig| {
        upstream.host = backend.ip().to_string();
        upstream.port = backend.port();
        upstream.timeout_secs = 5;
        upstream.retry.initial_delay_ms = 10;
        upstream.retry.max_delay_ms = 50;
        upstream.breaker.reset_timeout_ms = 300;
    };
    point(&mut config.upstreams.account);
    point(&mut config.upstreams.crm);
    point(&mut config.upstreams.logistics);
    point(&mut config.upstreams.purchase);
    point(&mut config.upstreams.task);

    config
}

/// Serve the full gateway router in-process; returns its base URL.
pub async fn start_gateway(config: GatewayConfig) -> String {
    let upstreams = Upstreams::from_config(&config.upstreams).unwrap();
    let router = HttpServer::new(config, upstreams).router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    format!("http://{addr}")
}

pub fn envelope(code: u16, message: &str, data: serde_json::Value) -> String {
    let status = if (200..300).contains(&code) { "success" } else { "error" };
    serde_json::json!({
        "code": code,
        "status": status,
        "message": message,
        "data": data,
    })
    .to_string()
}
