//! Keyboard shortcut: three ArrowDown presses toggle recognition

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Keys the page cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    ArrowDown,
    Other,
}

/// Detects `count` presses of ArrowDown within `window`
#[derive(Debug, Clone)]
pub struct TripleTap {
    presses: Vec<Instant>,
    window: Duration,
    count: usize,
}

impl TripleTap {
    pub fn new() -> Self {
        Self {
            presses: Vec::new(),
            window: Duration::from_millis(1500),
            count: 3,
        }
    }

    /// Record a key press. Returns `true` when the shortcut fires.
    pub fn press(&mut self, key: Key, now: Instant) -> bool {
        if key != Key::ArrowDown {
            self.presses.clear();
            return false;
        }

        self.presses.push(now);
        let window = self.window;
        self.presses
            .retain(|t| now.saturating_duration_since(*t) < window);

        if self.presses.len() >= self.count {
            self.presses.clear();
            return true;
        }
        false
    }
}

impl Default for TripleTap {
    fn default() -> Self {
        Self::new()
    }
}
