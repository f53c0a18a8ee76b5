use crate::Rect;

/// Identifier of an animation frame requested from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The shell embedding the grid: a browser page, a terminal UI or a test double.
///
/// The grid never scrolls or schedules anything itself. It asks the host, and
/// the host answers a requested frame by feeding
/// [`GridInput::Frame`](crate::GridInput::Frame) back into the session.
pub trait GridHost {
    /// Schedule one animation frame
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a frame that has not fired yet
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Horizontal scroll offset of the grid container
    fn scroll_left(&self) -> f64;

    /// Set the horizontal scroll offset of the grid container
    fn set_scroll_left(&mut self, value: f64);

    /// Container bounds in viewport coordinates
    fn container_rect(&self) -> Rect;

    /// Window viewport bounds
    fn window_rect(&self) -> Rect;
}

impl<H: GridHost + ?Sized> GridHost for &mut H {
    fn request_frame(&mut self) -> FrameHandle {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        (**self).cancel_frame(handle)
    }

    fn scroll_left(&self) -> f64 {
        (**self).scroll_left()
    }

    fn set_scroll_left(&mut self, value: f64) {
        (**self).set_scroll_left(value)
    }

    fn container_rect(&self) -> Rect {
        (**self).container_rect()
    }

    fn window_rect(&self) -> Rect {
        (**self).window_rect()
    }
}
