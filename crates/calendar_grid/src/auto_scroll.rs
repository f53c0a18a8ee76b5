use tracing::debug;

use crate::{FrameHandle, GridHost, InteractionConfig};

/// Scrolls the grid while a gesture holds the pointer near a visible edge.
///
/// Each scroll step happens on a host animation frame. The loop requests the
/// next frame only while the direction stays non-zero.
#[derive(Debug, Clone)]
pub struct AutoScroll {
    edge_threshold: f64,
    step: f64,
    label_width: f64,
    direction: i8,
    frame: Option<FrameHandle>,
}

impl AutoScroll {
    /// Controller using the thresholds in `config`
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            edge_threshold: config.edge_threshold_px,
            step: config.scroll_step_px,
            label_width: config.metrics.label_width,
            direction: 0,
            frame: None,
        }
    }

    /// Current direction: -1 left, 1 right, 0 still
    pub fn direction(&self) -> i8 {
        self.direction
    }

    /// Whether a frame is pending
    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    /// Direction implied by a pointer at `(x, y)`.
    ///
    /// The visible area is the container clipped to the window, minus the sticky
    /// label column. Pointers above or below it never scroll.
    pub fn scroll_direction<H: GridHost>(&self, host: &H, x: f64, y: f64) -> i8 {
        let visible = host.container_rect().intersect(&host.window_rect());
        if visible.width <= 0.0 || visible.height <= 0.0 {
            return 0;
        }
        if y < visible.top || y > visible.bottom() {
            return 0;
        }

        let left = visible.left + self.label_width;
        let right = visible.right();
        if x < left + self.edge_threshold {
            -1
        } else if x > right - self.edge_threshold {
            1
        } else {
            0
        }
    }

    /// Feed the pointer position of a running gesture
    pub fn update_scroll_direction<H: GridHost>(&mut self, host: &mut H, x: f64, y: f64) {
        let direction = self.scroll_direction(host, x, y);
        if direction == self.direction {
            return;
        }

        debug!("Auto-scroll direction {} -> {}", self.direction, direction);
        self.direction = direction;
        if direction == 0 {
            self.cancel_frame(host);
        } else if self.frame.is_none() {
            self.frame = Some(host.request_frame());
        }
    }

    /// Run one scroll step for `handle`. Returns whether the scroll offset changed.
    ///
    /// Stale handles are ignored. Reaching either end of the content ends the loop.
    pub fn on_frame<H: GridHost>(&mut self, host: &mut H, handle: FrameHandle, max_scroll: f64) -> bool {
        if self.frame != Some(handle) {
            return false;
        }
        self.frame = None;

        if self.direction == 0 {
            return false;
        }

        let current = host.scroll_left();
        let next = (current + f64::from(self.direction) * self.step).clamp(0.0, max_scroll.max(0.0));
        if (next - current).abs() < f64::EPSILON {
            debug!("Auto-scroll reached the edge");
            self.direction = 0;
            return false;
        }

        host.set_scroll_left(next);
        self.frame = Some(host.request_frame());
        true
    }

    /// Stop scrolling and cancel any pending frame
    pub fn stop<H: GridHost>(&mut self, host: &mut H) {
        self.direction = 0;
        self.cancel_frame(host);
    }

    fn cancel_frame<H: GridHost>(&mut self, host: &mut H) {
        if let Some(handle) = self.frame.take() {
            host.cancel_frame(handle);
        }
    }
}
