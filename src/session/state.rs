//! Authentication and connectivity state shared by every request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use url::Url;

/// Process-wide session: credential, backend endpoint, connectivity.
///
/// The token is swapped atomically so an attempt that starts after a
/// login/logout always sees the new value, even if the call itself began
/// earlier.
#[derive(Debug)]
pub struct Session {
    base_url: Url,
    token: ArcSwapOption<String>,
    connected: AtomicBool,
    last_sync: RwLock<Option<DateTime<Utc>>>,
}

impl Session {
    /// Create a signed-out session for the given backend.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: ArcSwapOption::empty(),
            connected: AtomicBool::new(true),
            last_sync: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a `/`-prefixed path against the base URL.
    ///
    /// Any path component of the base URL is kept, so a base of
    /// `https://host/api` and a path of `/players` yields `https://host/api/players`.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path))
    }

    /// Store a new bearer token.
    pub fn login(&self, token: impl Into<String>) {
        self.token.store(Some(Arc::new(token.into())));
        tracing::info!("Session credential updated");
    }

    /// Drop the bearer token.
    pub fn logout(&self) {
        self.token.store(None);
        tracing::info!("Session credential cleared");
    }

    /// Current bearer token, read fresh on every call.
    pub fn token(&self) -> Option<Arc<String>> {
        self.token.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::Relaxed);
        if previous != connected {
            tracing::info!(connected, "Backend connectivity changed");
        }
    }

    /// Time of the last successful request, if any.
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        match self.last_sync.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Record a successful round trip.
    pub fn mark_synced(&self) {
        let now = Utc::now();
        match self.last_sync.write() {
            Ok(mut guard) => *guard = Some(now),
            Err(poisoned) => *poisoned.into_inner() = Some(now),
        }
        self.set_connected(true);
    }
}
