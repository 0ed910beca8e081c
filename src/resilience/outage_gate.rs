//! Outage gate: a single-flight barrier with fan-out release.
//!
//! # States
//! - Open: requests flow normally, no notice shown
//! - Blocking: a critical failure was seen; one notice is shown and every
//!   caller (failed or newly started) parks as a waiter
//!
//! # State Transitions
//! ```text
//! Open → Blocking:  first critical failure (try_enter_outage returns true, notice shown)
//! Blocking → Open:  release_all (user tapped Retry): notice dismissed, all waiters woken
//! ```
//!
//! # Design Decisions
//! - One mutex guards the flag, the waiter list and the notifier calls, so
//!   "blocking" and "notice visible" can never disagree
//! - Each waiter owns a oneshot receiver; dropping it (cancellation) only
//!   discards that waiter
//! - No timeout-based release: only the user clears an outage

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::gateway::notifier::{OutageNotifier, SilentNotifier};
use crate::observability::metrics;

#[derive(Default)]
struct GateState {
    blocking: bool,
    waiters: Vec<oneshot::Sender<()>>,
    episode: u64,
}

/// Shared barrier coordinating suspension and resume of blocked calls.
pub struct OutageGate {
    state: Mutex<GateState>,
    notifier: Arc<dyn OutageNotifier>,
}

impl OutageGate {
    /// Create an open gate that reports outages through `notifier`.
    pub fn new(notifier: Arc<dyn OutageNotifier>) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            notifier,
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while an outage notice is displayed.
    pub fn is_blocking(&self) -> bool {
        self.state().blocking
    }

    /// Number of calls currently parked on the gate.
    pub fn waiter_count(&self) -> usize {
        let mut state = self.state();
        Self::prune_cancelled(&mut state);
        state.waiters.len()
    }

    /// Number of outages entered since the gate was created.
    pub fn episodes(&self) -> u64 {
        self.state().episode
    }

    /// Flip the gate to blocking.
    ///
    /// Returns true only for the caller that observed the `false → true`
    /// transition; that caller's `reason` is what the notice shows.
    pub fn try_enter_outage(&self, reason: &str) -> bool {
        let mut state = self.state();
        self.enter_locked(&mut state, reason)
    }

    /// Park on the gate if it is blocking. Returns `None` when the gate is open.
    pub fn join(&self) -> Option<Waiter> {
        let mut state = self.state();
        if !state.blocking {
            return None;
        }
        Some(Self::join_locked(&mut state))
    }

    /// Enter the outage (if not already entered) and park, atomically.
    ///
    /// The boolean is the same as [`OutageGate::try_enter_outage`]'s.
    pub fn enter_and_join(&self, reason: &str) -> (bool, Waiter) {
        let mut state = self.state();
        let first = self.enter_locked(&mut state, reason);
        (first, Self::join_locked(&mut state))
    }

    /// Clear the outage and wake every waiter. Returns how many were woken.
    ///
    /// Calling this while the gate is open is a no-op.
    pub fn release_all(&self) -> usize {
        let mut state = self.state();
        if !state.blocking {
            return 0;
        }

        Self::prune_cancelled(&mut state);
        let waiters = std::mem::take(&mut state.waiters);
        state.blocking = false;
        self.notifier.dismiss_outage();

        let count = waiters.len();
        for waiter in waiters {
            // The call may have been cancelled since pruning.
            let _ = waiter.send(());
        }
        metrics::record_suspended_calls(0);

        tracing::info!(episode = state.episode, released = count, "Outage cleared, resuming blocked requests");
        count
    }

    fn enter_locked(&self, state: &mut GateState, reason: &str) -> bool {
        if state.blocking {
            return false;
        }
        state.blocking = true;
        state.episode += 1;
        self.notifier.show_outage(reason);
        metrics::record_outage();

        tracing::warn!(episode = state.episode, reason = %reason, "Outage detected, blocking requests until retry");
        true
    }

    /// Drop senders whose waiter was cancelled.
    fn prune_cancelled(state: &mut GateState) {
        state.waiters.retain(|tx| !tx.is_closed());
    }

    fn join_locked(state: &mut GateState) -> Waiter {
        Self::prune_cancelled(state);
        let (tx, rx) = oneshot::channel();
        state.waiters.push(tx);
        metrics::record_suspended_calls(state.waiters.len());
        Waiter {
            rx,
            episode: state.episode,
        }
    }
}

impl Default for OutageGate {
    fn default() -> Self {
        Self::new(Arc::new(SilentNotifier))
    }
}

impl std::fmt::Debug for OutageGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("OutageGate")
            .field("blocking", &state.blocking)
            .field("waiters", &state.waiters.len())
            .field("episode", &state.episode)
            .finish()
    }
}

/// A parked call. Resolves when the outage it joined is cleared.
#[derive(Debug)]
pub struct Waiter {
    rx: oneshot::Receiver<()>,
    episode: u64,
}

impl Waiter {
    /// The outage episode this waiter belongs to.
    pub fn episode(&self) -> u64 {
        self.episode
    }
}

impl Future for Waiter {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // A dropped sender means the gate itself is gone; treat it as released.
        Pin::new(&mut self.get_mut().rx).poll(cx).map(|_| ())
    }
}
