//! Request gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Caller
//!     → request.rs (build: path check, JSON body, headers)
//!     → client.rs (execute loop)
//!         → gate open?  no → park on resilience::OutageGate
//!         → transport::Transport::send (credential re-read per attempt)
//!         → resilience::classify
//!             → success → decode T, mark session synced
//!             → stale   → silent retry
//!             → critical → notifier.rs shows one notice, park, replay on retry
//!             → surfaced → error.rs GatewayError
//! ```
//!
//! # Design Decisions
//! - Callers never see retry/suspend mechanics, only final outcomes
//! - No singleton: gateways are constructed with their collaborators
//! - Clones share one session and one gate

pub mod client;
pub mod error;
pub mod notifier;
pub mod request;

pub use client::Gateway;
pub use error::{GatewayError, GatewayResult};
pub use notifier::{ChannelNotifier, OutageEvent, OutageNotifier, SilentNotifier};
pub use request::{build_request, Method, RequestDescriptor, NO_BODY, X_REQUEST_ID};
