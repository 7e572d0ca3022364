//! Recognition session reducer
//!
//! `desired_listening` is the user's intent and survives engine restarts;
//! `listening` is what the engine last reported. Every scheduled restart
//! carries a token that is re-checked against the current intent when it
//! fires, so a restart queued before `stop` can never revive the session.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::engine::{EngineError, EngineEvent, SpeechEngine};
use crate::notice::Notice;

/// Delay before restarting after a non-fatal engine error
pub const ERROR_RESTART_DELAY: Duration = Duration::from_millis(1000);
/// Delay before restarting after the engine ended on its own
pub const END_RESTART_DELAY: Duration = Duration::from_millis(500);
/// Delay before restarting once the page can listen again
pub const VISIBLE_RESTART_DELAY: Duration = Duration::from_millis(500);

/// Identifies one scheduled restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartToken {
    epoch: u64,
    /// Skip the restart while a command is in flight
    require_idle: bool,
}

/// Work the owning page must carry out after a session call
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// Send a final transcript for classification. `seq` releases the
    /// command gate via [`RecognitionSession::release_gate`].
    Submit { transcript: String, seq: u64 },
    /// Call [`RecognitionSession::restart_due`] with `token` after `after`
    ScheduleRestart { token: RestartToken, after: Duration },
    /// Show a notice to the user
    Notify(Notice),
}

/// Per-page recognition state around a speech engine
pub struct RecognitionSession<E: SpeechEngine> {
    engine: E,
    listening: bool,
    desired_listening: bool,
    processing_command: bool,
    command_seq: u64,
    epoch: u64,
}

impl<E: SpeechEngine> RecognitionSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            listening: false,
            desired_listening: false,
            processing_command: false,
            command_seq: 0,
            epoch: 0,
        }
    }

    pub fn listening(&self) -> bool {
        self.listening
    }

    pub fn desired_listening(&self) -> bool {
        self.desired_listening
    }

    pub fn processing_command(&self) -> bool {
        self.processing_command
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// User asked to start listening
    pub fn start(&mut self) -> Vec<SessionEffect> {
        if self.listening {
            debug!("recognition already running");
            return Vec::new();
        }

        match self.engine.start() {
            Ok(()) => {
                self.desired_listening = true;
                info!("speech recognition starting");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "speech recognition failed to start");
                vec![SessionEffect::Notify(Notice::error(
                    "Failed to start voice recognition",
                ))]
            }
        }
    }

    /// User asked to stop listening. Clears intent before touching the engine.
    pub fn stop(&mut self) -> Vec<SessionEffect> {
        self.desired_listening = false;
        self.processing_command = false;
        self.epoch += 1;

        if !self.listening {
            return Vec::new();
        }

        self.engine.stop();
        self.listening = false;
        info!("speech recognition stopped");
        vec![SessionEffect::Notify(Notice::info("Voice recognition stopped"))]
    }

    pub fn toggle(&mut self) -> Vec<SessionEffect> {
        if self.listening {
            self.stop()
        } else {
            self.start()
        }
    }

    /// Stop the engine because the page can no longer listen; intent is kept
    pub fn suspend(&mut self) {
        if self.listening {
            debug!("suspending speech recognition");
            self.engine.stop();
        }
    }

    /// The page can listen again; restart if the user still wants to
    pub fn resume(&mut self) -> Vec<SessionEffect> {
        if self.desired_listening && !self.listening {
            vec![self.schedule_restart(VISIBLE_RESTART_DELAY, false)]
        } else {
            Vec::new()
        }
    }

    /// Reduce one engine event. `can_listen` is whether the page is
    /// visible and its tab active.
    pub fn handle(&mut self, event: EngineEvent, can_listen: bool) -> Vec<SessionEffect> {
        match event {
            EngineEvent::Start => {
                self.listening = true;
                info!("speech recognition started");
                vec![SessionEffect::Notify(Notice::info(
                    "Voice activated - Listening...",
                ))]
            }

            EngineEvent::Result { transcript, is_final } => {
                self.on_result(transcript, is_final)
            }

            EngineEvent::Error { error } => self.on_error(error),

            EngineEvent::End => {
                self.listening = false;
                debug!("speech recognition ended");
                if self.desired_listening && can_listen {
                    vec![self.schedule_restart(END_RESTART_DELAY, true)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_result(&mut self, transcript: String, is_final: bool) -> Vec<SessionEffect> {
        if !self.listening {
            debug!("result while not listening, ignored");
            return Vec::new();
        }
        if self.processing_command {
            debug!("already processing a command, result dropped");
            return Vec::new();
        }

        let transcript = transcript.trim();
        if !is_final || transcript.is_empty() {
            return Vec::new();
        }

        self.processing_command = true;
        self.command_seq += 1;
        debug!(%transcript, seq = self.command_seq, "final transcript");
        vec![SessionEffect::Submit {
            transcript: transcript.to_string(),
            seq: self.command_seq,
        }]
    }

    fn on_error(&mut self, error: EngineError) -> Vec<SessionEffect> {
        self.processing_command = false;
        self.listening = false;

        let mut effects = Vec::new();
        if error.is_silent() {
            debug!(%error, "transient speech error");
        } else {
            warn!(%error, "speech recognition error");
            effects.push(SessionEffect::Notify(Notice::error(format!(
                "Speech error: {}",
                error
            ))));
        }

        if error.is_fatal() {
            // The engine still sends `end` after this; nothing may revive it.
            self.desired_listening = false;
            self.epoch += 1;
            info!(%error, "speech recognition ended by fatal error");
        } else if self.desired_listening {
            effects.push(self.schedule_restart(ERROR_RESTART_DELAY, false));
        }
        effects
    }

    fn schedule_restart(&self, after: Duration, require_idle: bool) -> SessionEffect {
        SessionEffect::ScheduleRestart {
            token: RestartToken {
                epoch: self.epoch,
                require_idle,
            },
            after,
        }
    }

    /// A scheduled restart fired. Returns whether the engine was restarted.
    pub fn restart_due(&mut self, token: RestartToken, can_listen: bool) -> bool {
        if token.epoch != self.epoch || !self.desired_listening || !can_listen {
            debug!("stale restart skipped");
            return false;
        }
        if token.require_idle && self.processing_command {
            debug!("restart skipped while processing a command");
            return false;
        }
        if self.listening {
            return false;
        }

        match self.engine.start() {
            Ok(()) => {
                debug!("speech recognition restarted");
                true
            }
            Err(e) => {
                debug!(error = %e, "speech recognition restart failed");
                false
            }
        }
    }

    /// Reopen the command gate once the debounce window for `seq` elapsed
    pub fn release_gate(&mut self, seq: u64) {
        if seq == self.command_seq {
            self.processing_command = false;
            debug!(seq, "command gate released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeEngine {
        starts: usize,
        stops: usize,
        fail_start: Option<EngineError>,
    }

    impl SpeechEngine for FakeEngine {
        fn start(&mut self) -> Result<(), EngineError> {
            if let Some(e) = self.fail_start.clone() {
                return Err(e);
            }
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn listening_session() -> RecognitionSession<FakeEngine> {
        let mut session = RecognitionSession::new(FakeEngine::default());
        session.start();
        session.handle(EngineEvent::Start, true);
        session
    }

    fn restart_token(effects: &[SessionEffect]) -> Option<(RestartToken, Duration)> {
        effects.iter().find_map(|e| match e {
            SessionEffect::ScheduleRestart { token, after } => Some((*token, *after)),
            _ => None,
        })
    }

    fn final_result(text: &str) -> EngineEvent {
        EngineEvent::Result {
            transcript: text.to_string(),
            is_final: true,
        }
    }

    #[test]
    fn test_start_sets_intent_and_waits_for_engine() {
        let mut session = RecognitionSession::new(FakeEngine::default());
        session.start();
        assert!(session.desired_listening());
        assert!(!session.listening());

        let effects = session.handle(EngineEvent::Start, true);
        assert!(session.listening());
        assert!(matches!(effects[0], SessionEffect::Notify(_)));
    }

    #[test]
    fn test_start_failure_is_reported() {
        let mut session = RecognitionSession::new(FakeEngine {
            fail_start: Some(EngineError::NotAllowed),
            ..Default::default()
        });
        let effects = session.start();
        assert!(!session.desired_listening());
        assert_eq!(
            effects,
            vec![SessionEffect::Notify(Notice::error("Failed to start voice recognition"))]
        );
    }

    #[test]
    fn test_final_result_closes_gate() {
        let mut session = listening_session();

        let effects = session.handle(final_result("  scroll  "), true);
        assert_eq!(
            effects,
            vec![SessionEffect::Submit {
                transcript: "scroll".to_string(),
                seq: 1
            }]
        );
        assert!(session.processing_command());

        assert!(session.handle(final_result("stop"), true).is_empty());

        session.release_gate(1);
        assert!(!session.processing_command());
        assert_eq!(session.handle(final_result("stop"), true).len(), 1);
    }

    #[test]
    fn test_interim_and_blank_results_ignored() {
        let mut session = listening_session();
        let interim = EngineEvent::Result {
            transcript: "scroll".to_string(),
            is_final: false,
        };
        assert!(session.handle(interim, true).is_empty());
        assert!(session.handle(final_result("   "), true).is_empty());
        assert!(!session.processing_command());
    }

    #[test]
    fn test_stale_gate_release_is_ignored() {
        let mut session = listening_session();
        session.handle(final_result("scroll"), true);
        session.release_gate(1);
        session.handle(final_result("faster"), true);

        session.release_gate(1);
        assert!(session.processing_command());
    }

    #[test]
    fn test_transient_error_is_silent_and_restarts() {
        let mut session = listening_session();
        let effects = session.handle(EngineEvent::Error { error: EngineError::NoSpeech }, true);

        assert_eq!(effects.len(), 1);
        let (token, after) = restart_token(&effects).unwrap();
        assert_eq!(after, ERROR_RESTART_DELAY);

        assert!(session.restart_due(token, true));
        assert_eq!(session.engine().starts, 2);
    }

    #[test]
    fn test_fatal_error_suppresses_restart() {
        let mut session = listening_session();
        let effects = session.handle(EngineEvent::Error { error: EngineError::NotAllowed }, true);
        assert!(restart_token(&effects).is_none());
        assert!(matches!(&effects[0], SessionEffect::Notify(n) if n.message == "Speech error: not-allowed"));
        assert!(!session.desired_listening());

        // The trailing end event must not schedule a restart either.
        assert!(restart_token(&session.handle(EngineEvent::End, true)).is_none());
        assert!(!session.listening());
        assert_eq!(session.engine().starts, 1);
    }

    #[test]
    fn test_fatal_error_invalidates_pending_restart() {
        let mut session = listening_session();
        let (pending, _) =
            restart_token(&session.handle(EngineEvent::Error { error: EngineError::Network }, true))
                .unwrap();

        session.handle(EngineEvent::Error { error: EngineError::Aborted }, true);
        assert!(!session.restart_due(pending, true));
        assert_eq!(session.engine().starts, 1);
    }

    #[test]
    fn test_end_restarts_only_when_page_can_listen() {
        let mut session = listening_session();
        assert!(restart_token(&session.handle(EngineEvent::End, false)).is_none());

        session.handle(EngineEvent::Start, true);
        let effects = session.handle(EngineEvent::End, true);
        let (_, after) = restart_token(&effects).unwrap();
        assert_eq!(after, END_RESTART_DELAY);
    }

    #[test]
    fn test_stop_cancels_pending_restart() {
        let mut session = listening_session();
        let effects = session.handle(EngineEvent::End, true);
        let (token, _) = restart_token(&effects).unwrap();

        session.stop();
        assert!(!session.restart_due(token, true));
        assert_eq!(session.engine().starts, 1);
    }

    #[test]
    fn test_restart_from_before_stop_does_not_revive_new_session() {
        let mut session = listening_session();
        let (stale, _) = restart_token(&session.handle(EngineEvent::End, true)).unwrap();

        session.stop();
        session.start();
        assert!(!session.restart_due(stale, true));
        assert_eq!(session.engine().starts, 2);
    }

    #[test]
    fn test_end_restart_waits_for_idle_gate() {
        let mut session = listening_session();
        session.handle(final_result("scroll"), true);
        let (token, _) = restart_token(&session.handle(EngineEvent::End, true)).unwrap();
        assert!(!session.restart_due(token, true));
    }

    #[test]
    fn test_stop_while_listening_stops_engine() {
        let mut session = listening_session();
        let effects = session.stop();
        assert!(!session.listening());
        assert!(!session.desired_listening());
        assert_eq!(session.engine().stops, 1);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_suspend_keeps_intent_and_resume_schedules_restart() {
        let mut session = listening_session();
        session.suspend();
        assert_eq!(session.engine().stops, 1);
        session.handle(EngineEvent::End, false);
        assert!(session.desired_listening());

        let (token, after) = restart_token(&session.resume()).unwrap();
        assert_eq!(after, VISIBLE_RESTART_DELAY);
        assert!(session.restart_due(token, true));
    }
}
