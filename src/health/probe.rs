//! Backend health probe.

use std::time::Duration;

use serde::Deserialize;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::gateway::error::GatewayResult;
use crate::gateway::request::{build_request, Method, NO_BODY};
use crate::observability::metrics;
use crate::session::Session;
use crate::transport::Transport;

/// Body returned by the backend's health endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}

/// Probe the backend once and update the session's connectivity flag.
///
/// Only a malformed probe path is an error; every transport or protocol
/// failure yields `Ok(false)`.
pub async fn probe(
    transport: &dyn Transport,
    session: &Session,
    config: &HealthCheckConfig,
) -> GatewayResult<bool> {
    let request = build_request(session, &config.path, Method::Get, NO_BODY)?;
    let outgoing = request.resolve(session)?;
    let url = outgoing.url.clone();

    let timeout = Duration::from_secs(config.timeout_secs);
    let healthy = match time::timeout(timeout, transport.send(outgoing)).await {
        Ok(Ok(response)) if response.status.is_success() => {
            match serde_json::from_slice::<HealthResponse>(&response.body) {
                Ok(body) if body.is_healthy() => true,
                Ok(body) => {
                    tracing::warn!(url = %url, status = %body.status, "Health check failed: backend reports unhealthy");
                    false
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Health check failed: unexpected body");
                    false
                }
            }
        }
        Ok(Ok(response)) => {
            tracing::warn!(url = %url, status = %response.status, "Health check failed: non-success status");
            false
        }
        Ok(Err(e)) => {
            tracing::warn!(url = %url, error = %e, "Health check failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(url = %url, "Health check failed: timeout");
            false
        }
    };

    session.set_connected(healthy);
    metrics::record_health(healthy);
    Ok(healthy)
}
