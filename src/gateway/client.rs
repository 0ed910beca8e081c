//! The resilient request gateway.
//!
//! # Per-call state machine
//! ```text
//! Building → Sending → Success
//!                    → StaleRetry → Sending            (silent, bounded)
//!                    → Suspended  → Sending            (after user retry)
//!                    → Failed(kind)                    (terminal)
//! ```
//!
//! A call suspends either because its own attempt was critical or because it
//! started while the gate was already blocking. In the second case it parks
//! before doing any network I/O.

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::{GatewayConfig, HealthCheckConfig, RetryConfig};
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::notifier::OutageNotifier;
use crate::gateway::request::{build_request, Method, RequestDescriptor, NO_BODY};
use crate::health;
use crate::observability::metrics;
use crate::resilience::backoff::stale_retry_delay;
use crate::resilience::{classify, OutageGate, Outcome};
use crate::session::Session;
use crate::transport::{HttpTransport, Transport};

/// Builds and executes requests against one backend.
///
/// Cheap to clone; clones share the session, transport and outage gate.
#[derive(Clone)]
pub struct Gateway {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    gate: Arc<OutageGate>,
    retries: RetryConfig,
    health: HealthCheckConfig,
}

impl Gateway {
    /// Assemble a gateway from its collaborators, with default retry and
    /// health settings.
    pub fn new(session: Arc<Session>, transport: Arc<dyn Transport>, gate: Arc<OutageGate>) -> Self {
        Self {
            session,
            transport,
            gate,
            retries: RetryConfig::default(),
            health: HealthCheckConfig::default(),
        }
    }

    /// Build a gateway with an HTTP transport from validated configuration.
    pub fn from_config(
        config: &GatewayConfig,
        notifier: Arc<dyn OutageNotifier>,
    ) -> GatewayResult<Self> {
        let base_url = Url::parse(&config.endpoint.base_url)
            .map_err(|e| GatewayError::Config(format!("endpoint.base_url: {}", e)))?;
        let transport = HttpTransport::from_config(config)
            .map_err(|e| GatewayError::Config(format!("http client: {}", e)))?;

        tracing::info!(
            base_url = %base_url,
            request_timeout_secs = config.timeouts.request_secs,
            stale_retries = config.retries.stale_connection_attempts,
            "Gateway initialized"
        );

        Ok(Self::new(
            Arc::new(Session::new(base_url)),
            Arc::new(transport),
            Arc::new(OutageGate::new(notifier)),
        )
        .with_retry_config(config.retries.clone())
        .with_health_config(config.health_check.clone()))
    }

    pub fn with_retry_config(mut self, retries: RetryConfig) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_health_config(mut self, health: HealthCheckConfig) -> Self {
        self.health = health;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn gate(&self) -> &Arc<OutageGate> {
        &self.gate
    }

    /// True while an outage notice is up and calls are parked.
    pub fn is_blocking(&self) -> bool {
        self.gate.is_blocking()
    }

    /// Number of calls currently parked on the outage gate.
    pub fn suspended_calls(&self) -> usize {
        self.gate.waiter_count()
    }

    /// The user's "Retry" action: clear the outage and replay every parked call.
    pub fn retry_outage(&self) -> usize {
        self.gate.release_all()
    }

    /// Build a request against this gateway's session.
    pub fn build_request<B>(
        &self,
        path: &str,
        method: Method,
        body: Option<&B>,
    ) -> GatewayResult<RequestDescriptor>
    where
        B: Serialize + ?Sized,
    {
        build_request(&self.session, path, method, body)
    }

    /// Execute a request and decode its JSON body as `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> GatewayResult<T> {
        let started = Instant::now();
        let result = self.send_until_settled(request).await.and_then(|body| {
            serde_json::from_slice(&body).map_err(|e| {
                tracing::warn!(
                    request_id = %request.request_id(),
                    path = %request.path(),
                    error = %e,
                    "Response body did not match expected shape"
                );
                GatewayError::Decoding(e)
            })
        });
        self.finish(request, started, &result);
        result
    }

    /// Execute a request whose response body is irrelevant.
    pub async fn execute_void(&self, request: &RequestDescriptor) -> GatewayResult<()> {
        let started = Instant::now();
        let result = self.send_until_settled(request).await.map(|_| ());
        self.finish(request, started, &result);
        result
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        let request = self.build_request(path, Method::Get, NO_BODY)?;
        self.execute(&request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_request(path, Method::Post, Some(body))?;
        self.execute(&request).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_request(path, Method::Put, Some(body))?;
        self.execute(&request).await
    }

    pub async fn delete(&self, path: &str) -> GatewayResult<()> {
        let request = self.build_request(path, Method::Delete, NO_BODY)?;
        self.execute_void(&request).await
    }

    /// Probe the backend's health endpoint once, bypassing the outage gate.
    pub async fn check_health(&self) -> GatewayResult<bool> {
        health::probe(self.transport.as_ref(), &self.session, &self.health).await
    }

    /// Run attempts until one settles as success or a surfaced error.
    async fn send_until_settled(&self, request: &RequestDescriptor) -> GatewayResult<Vec<u8>> {
        let request_id = request.request_id();
        let mut attempt: u32 = 0;
        let mut stale_retries: u32 = 0;

        loop {
            if let Some(waiter) = self.gate.join() {
                tracing::debug!(
                    request_id = %request_id,
                    path = %request.path(),
                    episode = waiter.episode(),
                    "Outage in progress, waiting before send"
                );
                waiter.await;
                stale_retries = 0;
                continue;
            }

            attempt += 1;
            let outgoing = request.resolve(&self.session)?;
            tracing::debug!(
                request_id = %request_id,
                method = %request.method(),
                path = %request.path(),
                attempt,
                "Sending request"
            );

            let result = self.transport.send(outgoing).await;
            let silent_retry_available = stale_retries < self.retries.stale_connection_attempts;

            match classify(result, silent_retry_available) {
                Outcome::Success(body) => {
                    self.session.set_connected(true);
                    return Ok(body);
                }
                Outcome::StaleConnection(err) => {
                    stale_retries += 1;
                    metrics::record_stale_retry();
                    tracing::debug!(
                        request_id = %request_id,
                        retry = stale_retries,
                        error = %err,
                        "Stale connection, retrying silently"
                    );
                    tokio::time::sleep(stale_retry_delay(self.retries.stale_connection_delay_ms)).await;
                }
                Outcome::Critical(reason) => {
                    self.session.set_connected(false);
                    let (first, waiter) = self.gate.enter_and_join(&reason);
                    tracing::info!(
                        request_id = %request_id,
                        path = %request.path(),
                        attempt,
                        opened_outage = first,
                        reason = %reason,
                        "Critical failure, suspending until retry"
                    );
                    waiter.await;
                    stale_retries = 0;
                }
                Outcome::Failed(err) => return Err(err),
            }
        }
    }

    fn finish<T>(&self, request: &RequestDescriptor, started: Instant, result: &GatewayResult<T>) {
        let outcome = match result {
            Ok(_) => {
                self.session.mark_synced();
                "success"
            }
            Err(err) => {
                tracing::debug!(
                    request_id = %request.request_id(),
                    path = %request.path(),
                    error = %err,
                    "Request failed"
                );
                err.kind()
            }
        };
        metrics::record_request(request.method().as_str(), outcome, started);
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.session.base_url().as_str())
            .field("gate", &self.gate)
            .finish()
    }
}
