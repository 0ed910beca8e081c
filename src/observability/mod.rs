//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway, gate, probe produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via metrics)
//!
//! Consumers:
//!     → stderr (fmt layer, filtered by RUST_LOG or config log_level)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every per-call event
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
