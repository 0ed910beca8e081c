//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! login()/logout()  → state.rs (atomic token swap)
//! every attempt     → token() read fresh → Authorization header
//! success           → mark_synced() (last sync time, connected)
//! critical / probe  → set_connected()
//! ```
//!
//! # Design Decisions
//! - Token is never captured once per call; retries see logins/logouts
//! - Token lives in memory only; persistence belongs to the embedding app

pub mod state;

pub use state::Session;
