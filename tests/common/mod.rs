//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image_relay::config::RelayConfig;
use image_relay::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What a mock upstream answers to every request.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
    /// Send a `Content-Length` header; otherwise the body ends at connection close.
    pub content_length: bool,
    /// Delay before the response head is written.
    pub delay: Duration,
    /// `Location` header for redirect responses.
    pub location: Option<&'static str>,
}

impl MockResponse {
    pub fn image(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type),
            body,
            content_length: true,
            delay: Duration::ZERO,
            location: None,
        }
    }

    pub fn redirect(status: u16, location: &'static str) -> Self {
        Self {
            location: Some(location),
            ..Self::status(status)
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            body: b"nope".to_vec(),
            content_length: true,
            delay: Duration::ZERO,
            location: None,
        }
    }
}

/// A running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Lowercased request head of the most recent request.
    pub fn last_request(&self) -> String {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }

    /// Lowercased request heads of every request, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Mock",
    }
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).to_lowercase()
}

/// Path of the request target in a lowercased request head, without the query.
fn request_path(head: &str) -> &str {
    let target = head.split_whitespace().nth(1).unwrap_or("/");
    target.split('?').next().unwrap_or(target)
}

/// Start a mock upstream that answers every request with `response`.
pub async fn start_upstream(response: MockResponse) -> MockUpstream {
    start_routes(vec![("/", response)]).await
}

/// Start a mock upstream that answers by exact path. The last route is the
/// fallback for paths that match nothing.
pub async fn start_routes(routes: Vec<(&'static str, MockResponse)>) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let upstream = MockUpstream {
        addr,
        hits: hits.clone(),
        requests: requests.clone(),
    };

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = routes.clone();
            let hits = hits.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                hits.fetch_add(1, Ordering::SeqCst);

                let path = request_path(&head).to_string();
                let response = routes
                    .iter()
                    .find(|(route, _)| *route == path)
                    .or_else(|| routes.last())
                    .map(|(_, response)| response.clone())
                    .unwrap();
                requests.lock().unwrap().push(head);

                tokio::time::sleep(response.delay).await;

                let mut out = format!("HTTP/1.1 {} {}\r\n", response.status, reason(response.status));
                if let Some(ct) = response.content_type {
                    out.push_str(&format!("Content-Type: {}\r\n", ct));
                }
                if let Some(location) = response.location {
                    out.push_str(&format!("Location: {}\r\n", location));
                }
                if response.content_length {
                    out.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
                }
                out.push_str("Connection: close\r\n\r\n");

                if socket.write_all(out.as_bytes()).await.is_err() {
                    return;
                }
                for chunk in response.body.chunks(16 * 1024) {
                    if socket.write_all(chunk).await.is_err() {
                        return;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    upstream
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay config for tests: given origins, no env proxy, ephemeral port.
pub fn relay_config(origins: &[&str]) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.cors.allowed_origins = origins.iter().map(|s| s.to_string()).collect();
    config.upstream.use_env_proxy = false;
    config
}

/// A running relay server.
pub struct Relay {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Relay {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn proxy_url(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("http://{}/?url={}", self.addr, encoded)
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the relay on an ephemeral port.
pub async fn start_relay(config: RelayConfig) -> Relay {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    Relay { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
