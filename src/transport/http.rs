//! reqwest-backed transport.
//!
//! # Responsibilities
//! - Own the pooled HTTP client (connect/request timeouts, user agent)
//! - Execute one exchange per call, buffering the full body
//! - Reduce reqwest/hyper/io errors to a TransportErrorKind

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::GatewayConfig;
use crate::transport::{OutgoingRequest, RawResponse, Transport, TransportError, TransportErrorKind};

/// HTTP transport over a shared reqwest connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client using the configured timeouts and user agent.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .user_agent(config.endpoint.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(into_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(into_transport_error)?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

fn into_transport_error(err: reqwest::Error) -> TransportError {
    let kind = classify_reqwest_error(&err);
    TransportError::new(kind, error_chain(&err))
}

/// Map a reqwest error onto a transport error kind by walking its source chain.
pub(crate) fn classify_reqwest_error(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        return TransportErrorKind::TimedOut;
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if let Some(kind) = classify_io_error(io_err) {
                return kind;
            }
        }
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_canceled() {
                return TransportErrorKind::ConnectionLost;
            }
            if hyper_err.is_timeout() {
                return TransportErrorKind::TimedOut;
            }
        }
        source = cause.source();
    }

    let text = error_chain(err).to_ascii_lowercase();
    if is_unresolved_host(&text) {
        return TransportErrorKind::CannotResolveHost;
    }
    if text.contains("dns error") {
        return TransportErrorKind::Dns;
    }
    if err.is_connect() {
        return TransportErrorKind::CannotConnect;
    }
    TransportErrorKind::Other
}

pub(crate) fn classify_io_error(err: &io::Error) -> Option<TransportErrorKind> {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => Some(TransportErrorKind::ConnectionLost),
        io::ErrorKind::ConnectionRefused => Some(TransportErrorKind::CannotConnect),
        io::ErrorKind::NotConnected => Some(TransportErrorKind::NotConnected),
        io::ErrorKind::TimedOut => Some(TransportErrorKind::TimedOut),
        _ => None,
    }
}

fn is_unresolved_host(text: &str) -> bool {
    text.contains("failed to lookup address")
        || text.contains("name or service not known")
        || text.contains("nodename nor servname")
        || text.contains("no such host")
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
