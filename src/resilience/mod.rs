//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt result from the transport:
//!     → classify.rs (stale / critical / surfaced / success)
//!     → Stale: backoff.rs delay, silent retry (bounded per call)
//!     → Critical: outage_gate.rs (single notice, park until user retries)
//!     → Surfaced: returned to the caller unchanged
//! ```
//!
//! # Design Decisions
//! - Only stale connections retry without the user
//! - Critical failures never surface; the replay's outcome does
//! - One gate per backend, injected, never a global

pub mod backoff;
pub mod classify;
pub mod outage_gate;

pub use classify::{classify, Outcome};
pub use outage_gate::{OutageGate, Waiter};
