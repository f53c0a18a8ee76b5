//! # Reservation Sync
//!
//! Client side of the calendar backend. It fetches month snapshots, publishes
//! them on a `tokio::sync::watch` channel and applies every mutation
//! optimistically: the change shows up locally at once, then is reconciled
//! with the server's answer or rolled back when the request fails.

/// Error types for API calls and store operations
mod error;
pub use error::*;

/// Store tunables
mod config;
pub use config::*;

/// Backend contract and its request/response shapes
mod api;
pub use api::*;

/// reqwest implementation of the backend contract
mod http_client;
pub use http_client::*;

/// User-facing notices
mod notify;
pub use notify::*;

/// Apply, reconcile and roll back local patches
mod optimistic;
pub use optimistic::*;

/// Detection of mutations stuck in the saving state
mod failsafe;
pub use failsafe::*;

/// Snapshot owner and mutation entry points
mod store;
pub use store::*;
