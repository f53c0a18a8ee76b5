//! # Calendar Grid
//!
//! Headless engine behind the campsite-by-day scheduling grid. It turns pointer,
//! keyboard and frame input into drag, resize and range-selection gestures,
//! validates every candidate against the current calendar snapshot and composes
//! the month view a renderer draws.
//!
//! The grid never writes to the snapshot. Finished gestures are reported as
//! [`GridEvent`]s and the caller decides whether to apply them.

/// Tunables for pointer interaction
mod config;
pub use config::*;

/// Pixel, cell and percentage-span conversions
mod geometry;
pub use geometry::*;

/// Conflict checking against the occupancy index
mod validation;
pub use validation::*;

/// Items being manipulated and their ghost previews
mod item;
pub use item::*;

/// Range selection for creating bookings and blackouts
mod selection;
pub use selection::*;

/// Move and edge-resize gestures
mod drag;
pub use drag::*;

/// Collaborator trait the embedding shell implements
mod host;
pub use host::*;

/// Edge-proximity auto-scroll
mod auto_scroll;
pub use auto_scroll::*;

/// Horizontal panning
mod panning;
pub use panning::*;

/// Once-per-frame gate for preview computation
mod throttle;
pub use throttle::*;

/// Month view composition
mod view;
pub use view::*;

/// Event dispatch across every gesture machine
mod session;
pub use session::*;
