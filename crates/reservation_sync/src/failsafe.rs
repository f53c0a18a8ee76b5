use std::collections::HashMap;
use std::time::{Duration, Instant};

use campground_model::EntityKey;
use tracing::warn;

/// Watches the saving markers of the snapshot and decides when a mutation
/// has been stuck long enough to force a refresh
#[derive(Debug)]
pub struct StuckSavingWatchdog {
    timeout: Duration,
    throttle: Duration,
    first_seen: HashMap<EntityKey, Instant>,
    last_fired: Option<Instant>,
}

impl StuckSavingWatchdog {
    /// Watchdog firing after `timeout`, at most once per `throttle`
    pub fn new(timeout: Duration, throttle: Duration) -> Self {
        Self {
            timeout,
            throttle,
            first_seen: HashMap::new(),
            last_fired: None,
        }
    }

    /// Record the entities currently saving and report whether a refresh is due
    pub fn check(&mut self, saving: &[EntityKey], now: Instant) -> bool {
        self.first_seen.retain(|key, _| saving.contains(key));
        for key in saving {
            self.first_seen.entry(key.clone()).or_insert(now);
        }

        let stuck: Vec<&EntityKey> = self
            .first_seen
            .iter()
            .filter(|(_, since)| now.duration_since(**since) >= self.timeout)
            .map(|(key, _)| key)
            .collect();

        if stuck.is_empty() {
            return false;
        }

        if let Some(last) = self.last_fired {
            if now.duration_since(last) < self.throttle {
                return false;
            }
        }

        warn!(
            "⚠️ {} entities stuck saving for over {:?}: {:?}",
            stuck.len(),
            self.timeout,
            stuck
        );
        self.last_fired = Some(now);
        true
    }

    /// Forget every tracked entity
    pub fn reset(&mut self) {
        self.first_seen.clear();
    }
}
