//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use request_gateway::config::RetryConfig;
use request_gateway::gateway::{ChannelNotifier, Gateway, OutageEvent};
use request_gateway::transport::HttpTransport;
use request_gateway::{OutageGate, Session};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// A request as seen by the mock backend.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Handle to a running mock backend; dropping it leaves the backend running.
pub struct MockBackend {
    handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl MockBackend {
    /// Stop accepting connections and release the port.
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// Status that makes the mock backend close the socket without responding.
#[allow(dead_code)]
pub const DROP_CONNECTION: u16 = 0;

/// Start a programmable mock backend; `f` maps each request to (status, body).
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F) -> MockBackend
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        if status == DROP_CONNECTION {
                            return;
                        }
                        let status = reqwest::StatusCode::from_u16(status).unwrap();
                        let status_text = format!(
                            "{} {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown")
                        );

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { handle }
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
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
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        headers,
        body,
    })
}

/// Gateway against `addr` using the real HTTP transport, bypassing any
/// system proxy.
pub fn gateway_for(addr: SocketAddr) -> (Gateway, UnboundedReceiver<OutageEvent>) {
    let client = reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let (notifier, events) = ChannelNotifier::new();
    let session = Session::new(format!("http://{}", addr).parse().unwrap());

    let gateway = Gateway::new(
        Arc::new(session),
        Arc::new(HttpTransport::with_client(client)),
        Arc::new(OutageGate::new(Arc::new(notifier))),
    )
    .with_retry_config(RetryConfig {
        stale_connection_attempts: 2,
        stale_connection_delay_ms: 100,
    });

    (gateway, events)
}

/// Wait until at least `count` calls are parked on the gate.
#[allow(dead_code)]
pub async fn wait_for_suspended(gateway: &Gateway, count: usize) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while gateway.suspended_calls() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("calls did not suspend in time");
}

/// Collect every notice event delivered so far.
#[allow(dead_code)]
pub fn drain_events(events: &mut UnboundedReceiver<OutageEvent>) -> Vec<OutageEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
