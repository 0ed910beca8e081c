//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway::check_health / CLI before retry
//!     → probe.rs: single GET <health_check.path> with its own deadline
//!     → {"status": "healthy" | "ok"} → true, anything else → false
//!     → Session connectivity flag + gateway_health_probe gauge
//! ```
//!
//! # Design Decisions
//! - Probes bypass the outage gate: they exist to find out whether the
//!   backend is back while the gate is blocking
//! - A failed probe is a `false`, never an error

pub mod probe;

pub use probe::{probe, HealthResponse};
