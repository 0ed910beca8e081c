//! Resilient request gateway for a JSON game backend.
//!
//! Builds and executes requests, classifies failures, and coordinates every
//! concurrent caller through a single outage gate: one notice, one retry,
//! all parked calls replayed together.

pub mod config;
pub mod gateway;
pub mod health;
pub mod observability;
pub mod resilience;
pub mod session;
pub mod transport;

pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayError, GatewayResult, Method, RequestDescriptor};
pub use resilience::OutageGate;
pub use session::Session;
