//! Scroll state snapshot shared with observers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Slowest allowed speed, in pixels per tick
pub const MIN_SPEED: f64 = 0.5;
/// Fastest allowed speed, in pixels per tick
pub const MAX_SPEED: f64 = 5.0;
pub const DEFAULT_SPEED: f64 = 1.0;
/// Increment used by the faster/slower commands
pub const SPEED_STEP: f64 = 0.5;

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Down the page
    #[default]
    Forward,
    /// Up the page
    Backward,
}

impl Direction {
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Observable scroll state of one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    pub active: bool,
    pub paused: bool,
    pub speed: f64,
    pub direction: Direction,
    /// Paused by a hide/suspend rather than by the user
    pub suspended_by_suspend: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            active: false,
            paused: false,
            speed: DEFAULT_SPEED,
            direction: Direction::Forward,
            suspended_by_suspend: false,
        }
    }
}

/// Partial update merged into a known state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_by_suspend: Option<bool>,
}

impl ScrollState {
    /// Merge a patch; speed is clamped, non-finite speeds are ignored
    pub fn apply(&mut self, patch: &ScrollStatePatch) {
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(paused) = patch.paused {
            self.paused = paused;
        }
        if let Some(speed) = patch.speed.filter(|s| s.is_finite()) {
            self.speed = clamp_speed(speed);
        }
        if let Some(direction) = patch.direction {
            self.direction = direction;
        }
        if let Some(suspended) = patch.suspended_by_suspend {
            self.suspended_by_suspend = suspended;
        }
    }

    /// Whether a tick would move the page
    pub fn is_running(&self) -> bool {
        self.active && !self.paused
    }
}

impl From<ScrollState> for ScrollStatePatch {
    fn from(state: ScrollState) -> Self {
        Self {
            active: Some(state.active),
            paused: Some(state.paused),
            speed: Some(state.speed),
            direction: Some(state.direction),
            suspended_by_suspend: Some(state.suspended_by_suspend),
        }
    }
}

pub(crate) fn clamp_speed(speed: f64) -> f64 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}
