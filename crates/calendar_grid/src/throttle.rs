use std::time::Duration;

/// Lets at most one preview computation through per frame interval.
///
/// Timestamps are the event times supplied by the host, so the gate is
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct FrameGate {
    interval: Duration,
    last: Option<Duration>,
}

impl FrameGate {
    /// Gate opening once every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether work may run at `now`; records the run when it may
    pub fn ready(&mut self, now: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forget the last run so the next call passes
    pub fn reset(&mut self) {
        self.last = None;
    }
}
