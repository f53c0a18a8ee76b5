use std::time::Duration;

/// Configuration for the calendar store
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How long an entity may stay in the saving state before a refresh (default: 10 seconds)
    pub stuck_timeout: Duration,

    /// Minimum time between two failsafe refreshes (default: 5 seconds)
    pub failsafe_throttle: Duration,

    /// How often the failsafe task inspects the snapshot (default: 1 second)
    pub failsafe_poll_interval: Duration,

    /// Focus and reconnect events closer together than this refresh once (default: 2 seconds)
    pub focus_dedupe: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stuck_timeout: Duration::from_secs(10),
            failsafe_throttle: Duration::from_secs(5),
            failsafe_poll_interval: Duration::from_secs(1),
            focus_dedupe: Duration::from_secs(2),
        }
    }
}
