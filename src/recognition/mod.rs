//! Speech recognition session management
//!
//! The speech engine is consumed as an event stream
//! (start / result / error / end). `RecognitionSession` reduces those
//! events into effects for the owning page: transcripts to submit,
//! restarts to schedule and notices to show.

mod debounce;
mod engine;
mod session;

pub use debounce::{Debouncer, MIN_DEBOUNCE_WINDOW};
pub use engine::{EngineError, EngineEvent, SpeechEngine};
pub use session::{
    RecognitionSession, RestartToken, SessionEffect, END_RESTART_DELAY, ERROR_RESTART_DELAY,
    VISIBLE_RESTART_DELAY,
};
