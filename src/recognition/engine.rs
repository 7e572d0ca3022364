//! Speech engine seam

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the speech engine
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineError {
    #[error("no-speech")]
    NoSpeech,

    #[error("audio-capture")]
    AudioCapture,

    #[error("not-allowed")]
    NotAllowed,

    #[error("aborted")]
    Aborted,

    #[error("network")]
    Network,

    /// `start` called while the engine is already running
    #[error("invalid-state")]
    InvalidState,

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Parse an engine error code such as `no-speech`
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => EngineError::NoSpeech,
            "audio-capture" => EngineError::AudioCapture,
            "not-allowed" => EngineError::NotAllowed,
            "aborted" => EngineError::Aborted,
            "network" => EngineError::Network,
            "invalid-state" => EngineError::InvalidState,
            other => EngineError::Other(other.to_string()),
        }
    }

    /// Transient errors that are never shown to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, EngineError::NoSpeech | EngineError::AudioCapture)
    }

    /// Errors that end the session without an automatic restart
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::NotAllowed | EngineError::Aborted)
    }
}

/// Lifecycle events produced by a running engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Start,
    Result { transcript: String, is_final: bool },
    Error { error: EngineError },
    End,
}

/// Start/stop controls of a speech-to-text engine
///
/// Events are delivered asynchronously to the owning page, never
/// returned from these calls.
pub trait SpeechEngine: Send {
    fn start(&mut self) -> Result<(), EngineError>;
    fn stop(&mut self);
}
