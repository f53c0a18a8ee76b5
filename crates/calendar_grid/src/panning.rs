use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanDrag {
    pointer_id: u32,
    start_x: f64,
    start_scroll: f64,
}

/// Horizontal panning with Space held, by dragging the day header, or with Shift+wheel
#[derive(Debug, Clone)]
pub struct PanController {
    day_width: f64,
    space_held: bool,
    hovering: bool,
    drag: Option<PanDrag>,
}

impl PanController {
    /// Controller nudging by `day_width` per wheel notch
    pub fn new(day_width: f64) -> Self {
        Self {
            day_width,
            space_held: false,
            hovering: false,
            drag: None,
        }
    }

    /// Track the Space key
    pub fn set_space_held(&mut self, held: bool) {
        self.space_held = held;
    }

    /// Track whether the pointer is over the grid
    pub fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    /// Whether the next pointer-down starts a pan instead of any other gesture
    pub fn is_armed(&self) -> bool {
        self.space_held && self.hovering
    }

    /// Whether a pan drag is running
    pub fn is_panning(&self) -> bool {
        self.drag.is_some()
    }

    /// Claim a pointer-down when armed or pressed on the header
    pub fn try_begin(&mut self, pointer_id: u32, x: f64, over_header: bool, scroll_left: f64) -> bool {
        if self.drag.is_some() || !(self.is_armed() || over_header) {
            return false;
        }

        debug!("Pan started at x={}", x);
        self.drag = Some(PanDrag {
            pointer_id,
            start_x: x,
            start_scroll: scroll_left,
        });
        true
    }

    /// Scroll offset for the pointer at `x`, following it one to one
    pub fn update(&self, pointer_id: u32, x: f64, max_scroll: f64) -> Option<f64> {
        let drag = self.drag.filter(|d| d.pointer_id == pointer_id)?;
        Some(clamp_scroll(drag.start_scroll - (x - drag.start_x), max_scroll))
    }

    /// Release the pan pointer. Returns whether it was panning.
    pub fn finish(&mut self, pointer_id: u32) -> bool {
        if self.drag.is_some_and(|d| d.pointer_id == pointer_id) {
            self.drag = None;
            return true;
        }
        false
    }

    /// Drop any pan drag and key state
    pub fn cancel(&mut self) {
        self.drag = None;
        self.space_held = false;
    }

    /// Scroll offset after a wheel notch, Shift+wheel only
    pub fn wheel(&self, delta_y: f64, shift: bool, scroll_left: f64, max_scroll: f64) -> Option<f64> {
        if !shift || delta_y == 0.0 {
            return None;
        }
        Some(clamp_scroll(
            scroll_left + self.day_width * delta_y.signum(),
            max_scroll,
        ))
    }
}

fn clamp_scroll(value: f64, max_scroll: f64) -> f64 {
    value.clamp(0.0, max_scroll.max(0.0))
}
