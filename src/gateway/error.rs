//! Gateway error taxonomy.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced to gateway callers.
///
/// Critical failures (5xx, lost connectivity) are not represented here: they
/// suspend the call until the user retries, and only the replay's outcome is
/// returned.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 401 from the backend.
    #[error("Unauthorized")]
    Unauthorized,

    /// 403 from the backend, with the server's message.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404 from the backend, with the server's message.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status that does not block the gateway.
    #[error("Server error: {0}")]
    ServerError(String),

    /// A 2xx body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decoding(#[source] serde_json::Error),

    /// Transport failure that is neither critical nor a stale connection.
    #[error("Network error: {0}")]
    Network(#[source] TransportError),

    /// Request body or header could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encoding(String),

    /// Request path does not begin with '/' or does not form a valid URL.
    #[error("Invalid request path '{0}'")]
    InvalidPath(String),

    /// The gateway could not be constructed from configuration.
    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::ServerError(_) => "server_error",
            GatewayError::Decoding(_) => "decoding",
            GatewayError::Network(_) => "network",
            GatewayError::Encoding(_) => "encoding",
            GatewayError::InvalidPath(_) => "invalid_path",
            GatewayError::Config(_) => "config",
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
