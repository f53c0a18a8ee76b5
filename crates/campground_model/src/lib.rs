//! # Campground Model
//!
//! Shared data model for the campground scheduling calendar: campsites,
//! reservations, blackouts, the per-month calendar snapshot and the date
//! arithmetic used by every other crate in the workspace.

/// Model error type
mod error;
pub use error::*;

/// Calendar month ranges and day-level date helpers
mod month;
pub use month::*;

/// Campsite, reservation and blackout types
mod types;
pub use types::*;
