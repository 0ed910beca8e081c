//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway attempt
//!     → OutgoingRequest (url, method, headers, body)
//!     → Transport::send (http.rs: reqwest client)
//!     → RawResponse { status, body }   or   TransportError { kind, message }
//! ```
//!
//! # Design Decisions
//! - The gateway never sees reqwest errors; they are reduced to a
//!   TransportErrorKind so classification is transport-independent
//! - Transports do no retrying of their own
//! - Trait object seam so tests can script outages deterministically

pub mod http;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

pub use http::HttpTransport;

/// A fully resolved request, ready for one attempt.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Coarse cause of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The network is down on this side.
    NotConnected,
    /// An established (usually pooled keep-alive) connection dropped.
    ConnectionLost,
    TimedOut,
    CannotConnect,
    CannotResolveHost,
    Dns,
    /// Anything else: bad URL, redirect loop, body stream error.
    Other,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::NotConnected => "not_connected",
            TransportErrorKind::ConnectionLost => "connection_lost",
            TransportErrorKind::TimedOut => "timed_out",
            TransportErrorKind::CannotConnect => "cannot_connect",
            TransportErrorKind::CannotResolveHost => "cannot_resolve_host",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Other => "other",
        }
    }
}

/// Errors raised by a [`Transport`] before any HTTP status was received.
#[derive(Debug, Clone, Error)]
#[error("{} ({})", .kind.as_str(), .message)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Executes a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError>;
}
