//! Minimum spacing between accepted commands

use std::time::Duration;

use tokio::time::Instant;

/// Shortest debounce window the page accepts
pub const MIN_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Drops anything arriving within `window` of the last accepted call
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.max(MIN_DEBOUNCE_WINDOW),
            last: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept and record `now`, or reject without recording
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(MIN_DEBOUNCE_WINDOW)
    }
}
