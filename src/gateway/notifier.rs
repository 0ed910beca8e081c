//! Outage notice seam.
//!
//! The gate calls these hooks while holding its lock, so implementations must
//! not block and must not call back into the gate.

use tokio::sync::mpsc;

/// Shows and hides the single user-visible outage notice.
pub trait OutageNotifier: Send + Sync {
    fn show_outage(&self, reason: &str);
    fn dismiss_outage(&self);
}

/// Logs only. For headless callers that drive `retry_outage` themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl OutageNotifier for SilentNotifier {
    fn show_outage(&self, reason: &str) {
        tracing::debug!(reason = %reason, "Outage notice suppressed");
    }

    fn dismiss_outage(&self) {}
}

/// Notice lifecycle events forwarded by [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutageEvent {
    Shown(String),
    Dismissed,
}

/// Forwards notice events to a receiver, e.g. a UI task that renders the
/// prompt and calls `Gateway::retry_outage` when the user confirms.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<OutageEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutageNotifier for ChannelNotifier {
    fn show_outage(&self, reason: &str) {
        if self.tx.send(OutageEvent::Shown(reason.to_string())).is_err() {
            tracing::warn!("Outage notice receiver dropped");
        }
    }

    fn dismiss_outage(&self) {
        let _ = self.tx.send(OutageEvent::Dismissed);
    }
}
