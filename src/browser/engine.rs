//! Scripted speech engine for headless pages
//!
//! Start and stop are echoed back as engine events; transcripts and
//! failures are fed in from outside through an [`EngineControl`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::page::{PageLink, PageMessage};
use crate::recognition::{EngineError, EngineEvent, SpeechEngine};

pub struct ScriptedEngine {
    control: EngineControl,
}

impl ScriptedEngine {
    pub fn new(link: PageLink) -> Self {
        Self {
            control: EngineControl {
                link,
                running: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    /// Handle for driving this engine from outside the page
    pub fn control(&self) -> EngineControl {
        self.control.clone()
    }
}

impl SpeechEngine for ScriptedEngine {
    fn start(&mut self) -> Result<(), EngineError> {
        if self.control.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::InvalidState);
        }
        self.control.emit(EngineEvent::Start);
        Ok(())
    }

    fn stop(&mut self) {
        if self.control.running.swap(false, Ordering::SeqCst) {
            self.control.emit(EngineEvent::End);
        }
    }
}

/// Shared side of a [`ScriptedEngine`]
#[derive(Debug, Clone)]
pub struct EngineControl {
    link: PageLink,
    running: Arc<AtomicBool>,
}

impl EngineControl {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Fail the running session: `error` then `end`, like a browser engine.
    /// Returns `false` if the engine was not running.
    pub fn fail(&self, error: EngineError) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.emit(EngineEvent::Error { error });
        self.emit(EngineEvent::End);
        true
    }

    fn emit(&self, event: EngineEvent) {
        if self.link.post(PageMessage::Engine(event)).is_err() {
            debug!(tab_id = %self.link.tab_id(), "page gone, engine event dropped");
        }
    }
}
