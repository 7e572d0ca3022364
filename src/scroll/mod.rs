//! Continuous scrolling state machine
//!
//! States: Idle -> Active (running) <-> Active (paused) -> Idle.
//! The recurring tick is owned by the machine; nothing else may start or
//! cancel it.

mod machine;
mod state;
mod ticker;

pub use machine::ScrollMachine;
pub use state::{
    Direction, ScrollState, ScrollStatePatch, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED, SPEED_STEP,
};
pub use ticker::{IntervalTicker, TickHandle, TickScheduler, DEFAULT_TICK_INTERVAL};
