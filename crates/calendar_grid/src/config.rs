use std::time::Duration;

use crate::GridMetrics;

/// Configuration for the interaction session
#[derive(Debug, Clone)]
pub struct InteractionConfig {
    /// Distance from a visible edge that starts auto-scroll (default: 60px)
    pub edge_threshold_px: f64,

    /// Pixels scrolled per animation frame while auto-scrolling (default: 12px)
    pub scroll_step_px: f64,

    /// Minimum time between two preview computations (default: 16ms, one frame)
    pub frame_interval: Duration,

    /// Width of the resize handle at each end of a block (default: 8px)
    pub handle_width_px: f64,

    /// Rendered sizes of the grid
    pub metrics: GridMetrics,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            edge_threshold_px: 60.0,
            scroll_step_px: 12.0,
            frame_interval: Duration::from_millis(16),
            handle_width_px: 8.0,
            metrics: GridMetrics::default(),
        }
    }
}
