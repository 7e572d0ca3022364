//! Scroll state machine
//!
//! Owns the per-page scroll state and the recurring tick. A tick handle
//! exists exactly while the machine is active.

use std::time::Duration;

use tracing::{debug, info};

use super::state::{clamp_speed, Direction, ScrollState, MAX_SPEED, MIN_SPEED};
use super::ticker::{TickHandle, TickScheduler};

/// Per-page continuous scrolling controller
pub struct ScrollMachine<S: TickScheduler> {
    state: ScrollState,
    tick: Option<TickHandle>,
    scheduler: S,
    period: Duration,
}

impl<S: TickScheduler> ScrollMachine<S> {
    pub fn new(scheduler: S, period: Duration) -> Self {
        Self {
            state: ScrollState::default(),
            tick: None,
            scheduler,
            period,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Whether a recurring tick is scheduled
    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    /// Idle -> Active(running). No-op if already active.
    pub fn start(&mut self) -> bool {
        if self.state.active {
            debug!("already scrolling, start ignored");
            return false;
        }

        self.state.active = true;
        self.state.paused = false;
        self.state.suspended_by_suspend = false;
        self.tick = Some(self.scheduler.schedule(self.period));

        info!(speed = self.state.speed, direction = %self.state.direction, "scrolling started");
        true
    }

    /// Active -> Idle. Resets pause and direction; speed is retained.
    pub fn stop(&mut self) -> bool {
        let was_active = self.state.active;

        self.state.active = false;
        self.state.paused = false;
        self.state.suspended_by_suspend = false;
        self.state.direction = Direction::default();

        if let Some(tick) = self.tick.take() {
            tick.cancel();
            debug!("scroll tick cancelled");
        }

        if was_active {
            info!("scrolling stopped");
        }
        was_active
    }

    /// Flip pause while active. No-op when idle.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.state.active {
            return false;
        }
        self.state.paused = !self.state.paused;
        // The user now owns the pause state.
        self.state.suspended_by_suspend = false;
        debug!(paused = self.state.paused, "scroll pause toggled");
        true
    }

    /// Active(paused) -> Active(running). No-op otherwise.
    pub fn resume(&mut self) -> bool {
        self.state.suspended_by_suspend = false;
        self.unpause()
    }

    fn unpause(&mut self) -> bool {
        if !(self.state.active && self.state.paused) {
            return false;
        }
        self.state.paused = false;
        debug!("scrolling resumed");
        true
    }

    /// Adjust speed by `delta`, clamped. Returns the new speed.
    pub fn change_speed(&mut self, delta: f64) -> f64 {
        self.state.speed = clamp_speed(self.state.speed + delta);
        debug!(speed = self.state.speed, "scroll speed changed");
        self.state.speed
    }

    /// Set an absolute speed. Values outside the allowed range are
    /// rejected and leave the state untouched.
    pub fn set_speed(&mut self, speed: f64) -> Option<f64> {
        if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            debug!(speed, "scroll speed out of range, ignored");
            return None;
        }
        self.state.speed = speed;
        debug!(speed, "scroll speed set");
        Some(speed)
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.state.direction = direction;
        debug!(%direction, "scroll direction set");
    }

    /// Pause on behalf of the page being hidden or the tab losing focus
    pub fn suspend(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.state.paused = true;
        self.state.suspended_by_suspend = true;
        debug!("scrolling suspended");
        true
    }

    /// Undo a [`suspend`](Self::suspend); a user pause is left alone
    pub fn restore(&mut self) -> bool {
        if !self.state.suspended_by_suspend {
            return false;
        }
        self.state.suspended_by_suspend = false;
        self.unpause()
    }

    /// One tick. Returns the scroll delta to apply, or `None` when the
    /// page should not move. The tick stays scheduled either way.
    pub fn tick(&self, page_visible: bool) -> Option<f64> {
        if !self.state.is_running() || !page_visible {
            return None;
        }
        Some(self.state.speed * self.state.direction.sign())
    }
}
