//! Failure classification.
//!
//! # Rules (applied in order)
//! 1. Connection lost with silent retries left → stale connection
//! 2. Not connected / connection lost / timed out / cannot connect /
//!    cannot resolve host / DNS → critical
//! 3. Status >= 500 → critical
//! 4. Any other transport error → Network, surfaced
//! 5. 401 / 403 / 404 → typed error, surfaced
//! 6. 2xx → success (decoding is the caller's job; a bad body is terminal)
//!
//! Remaining non-2xx statuses surface as ServerError.

use reqwest::StatusCode;
use serde_json::Value;

use crate::gateway::error::GatewayError;
use crate::transport::{RawResponse, TransportError, TransportErrorKind};

/// What the execute loop should do with one attempt's result.
#[derive(Debug)]
pub enum Outcome {
    /// 2xx; the body still has to be decoded.
    Success(Vec<u8>),
    /// Dropped keep-alive: retry silently after a short delay.
    StaleConnection(TransportError),
    /// Block every caller until the user retries.
    Critical(String),
    /// Surface to the caller immediately.
    Failed(GatewayError),
}

/// Classify one attempt.
///
/// `silent_retry_available` is false once the per-call stale-connection
/// budget is spent, at which point a lost connection counts as critical.
pub fn classify(
    result: Result<RawResponse, TransportError>,
    silent_retry_available: bool,
) -> Outcome {
    match result {
        Err(err) => classify_transport(err, silent_retry_available),
        Ok(response) => classify_response(response),
    }
}

fn classify_transport(err: TransportError, silent_retry_available: bool) -> Outcome {
    match err.kind {
        TransportErrorKind::ConnectionLost if silent_retry_available => Outcome::StaleConnection(err),
        TransportErrorKind::NotConnected
        | TransportErrorKind::ConnectionLost
        | TransportErrorKind::TimedOut
        | TransportErrorKind::CannotConnect
        | TransportErrorKind::CannotResolveHost
        | TransportErrorKind::Dns => Outcome::Critical(err.to_string()),
        TransportErrorKind::Other => Outcome::Failed(GatewayError::Network(err)),
    }
}

fn classify_response(response: RawResponse) -> Outcome {
    let status = response.status;
    if status.is_server_error() {
        let reason = error_detail(&response.body)
            .unwrap_or_else(|| format!("Server returned status {}", status.as_u16()));
        return Outcome::Critical(reason);
    }
    if status.is_success() {
        return Outcome::Success(response.body);
    }

    let detail = error_detail(&response.body);
    let err = match status {
        StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
        StatusCode::FORBIDDEN => {
            GatewayError::Forbidden(detail.unwrap_or_else(|| "Access denied".to_string()))
        }
        StatusCode::NOT_FOUND => {
            GatewayError::NotFound(detail.unwrap_or_else(|| "Resource not found".to_string()))
        }
        other => GatewayError::ServerError(
            detail.unwrap_or_else(|| format!("Server returned status {}", other.as_u16())),
        ),
    };
    Outcome::Failed(err)
}

/// Extract the `detail` string from a JSON error body.
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}
