//! Action identifiers and the voice command wire encoding

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix of the absolute speed command, e.g. `setScrollSpeed:2.5`
pub const SET_SCROLL_SPEED_PREFIX: &str = "setScrollSpeed:";

/// Discrete actions a page instance can execute
///
/// Declaration order matches the default catalog order, which decides
/// fuzzy-match tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionId {
    StartScrolling,
    StopScrolling,
    PauseScrolling,
    ResumeScrolling,
    IncreaseSpeed,
    DecreaseSpeed,
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,
    LeftTab,
    RightTab,
    PauseVideo,
    PlayVideo,
    MaximizeVideo,
    MinimizeVideo,
    MaximizeWindow,
    MinimizeWindow,
    StopListening,
    Goodbye,
    GoBack,
    GoForward,
    Refresh,
    ZoomIn,
    ZoomOut,
    FocusSearch,
}

impl ActionId {
    /// Every action, in catalog order
    pub const ALL: [ActionId; 26] = [
        ActionId::StartScrolling,
        ActionId::StopScrolling,
        ActionId::PauseScrolling,
        ActionId::ResumeScrolling,
        ActionId::IncreaseSpeed,
        ActionId::DecreaseSpeed,
        ActionId::ScrollUp,
        ActionId::ScrollDown,
        ActionId::GoToTop,
        ActionId::GoToBottom,
        ActionId::LeftTab,
        ActionId::RightTab,
        ActionId::PauseVideo,
        ActionId::PlayVideo,
        ActionId::MaximizeVideo,
        ActionId::MinimizeVideo,
        ActionId::MaximizeWindow,
        ActionId::MinimizeWindow,
        ActionId::StopListening,
        ActionId::Goodbye,
        ActionId::GoBack,
        ActionId::GoForward,
        ActionId::Refresh,
        ActionId::ZoomIn,
        ActionId::ZoomOut,
        ActionId::FocusSearch,
    ];

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::StartScrolling => "startScrolling",
            ActionId::StopScrolling => "stopScrolling",
            ActionId::PauseScrolling => "pauseScrolling",
            ActionId::ResumeScrolling => "resumeScrolling",
            ActionId::IncreaseSpeed => "increaseSpeed",
            ActionId::DecreaseSpeed => "decreaseSpeed",
            ActionId::ScrollUp => "scrollUp",
            ActionId::ScrollDown => "scrollDown",
            ActionId::GoToTop => "goToTop",
            ActionId::GoToBottom => "goToBottom",
            ActionId::LeftTab => "leftTab",
            ActionId::RightTab => "rightTab",
            ActionId::PauseVideo => "pauseVideo",
            ActionId::PlayVideo => "playVideo",
            ActionId::MaximizeVideo => "maximizeVideo",
            ActionId::MinimizeVideo => "minimizeVideo",
            ActionId::MaximizeWindow => "maximizeWindow",
            ActionId::MinimizeWindow => "minimizeWindow",
            ActionId::StopListening => "stopListening",
            ActionId::Goodbye => "goodbye",
            ActionId::GoBack => "goBack",
            ActionId::GoForward => "goForward",
            ActionId::Refresh => "refresh",
            ActionId::ZoomIn => "zoomIn",
            ActionId::ZoomOut => "zoomOut",
            ActionId::FocusSearch => "focusSearch",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionId::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or(())
    }
}

/// A command delivered to a page for execution
///
/// Encoded on the wire as a single string: either an action name or
/// `setScrollSpeed:<float>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VoiceCommand {
    /// One of the catalog actions
    Action(ActionId),
    /// Absolute speed request; `None` when the value did not parse
    SetScrollSpeed(Option<f64>),
    /// Anything else; reported to the user as not recognized
    Unknown(String),
}

impl VoiceCommand {
    /// Parse the wire encoding. Never fails: bad input becomes `Unknown`
    /// or an unparseable speed.
    pub fn parse(raw: &str) -> Self {
        if let Some(value) = raw.strip_prefix(SET_SCROLL_SPEED_PREFIX) {
            return VoiceCommand::SetScrollSpeed(value.trim().parse::<f64>().ok());
        }
        match raw.parse::<ActionId>() {
            Ok(action) => VoiceCommand::Action(action),
            Err(()) => VoiceCommand::Unknown(raw.to_string()),
        }
    }
}

impl From<ActionId> for VoiceCommand {
    fn from(action: ActionId) -> Self {
        VoiceCommand::Action(action)
    }
}

impl From<String> for VoiceCommand {
    fn from(raw: String) -> Self {
        VoiceCommand::parse(&raw)
    }
}

impl From<VoiceCommand> for String {
    fn from(command: VoiceCommand) -> Self {
        command.to_string()
    }
}

impl fmt::Display for VoiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceCommand::Action(action) => f.write_str(action.as_str()),
            VoiceCommand::SetScrollSpeed(Some(speed)) => {
                write!(f, "{}{}", SET_SCROLL_SPEED_PREFIX, speed)
            }
            VoiceCommand::SetScrollSpeed(None) => write!(f, "{}NaN", SET_SCROLL_SPEED_PREFIX),
            VoiceCommand::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        let json = serde_json::to_string(&ActionId::GoToTop).unwrap();
        assert_eq!(json, "\"goToTop\"");
        for action in ActionId::ALL {
            assert_eq!(action.as_str().parse::<ActionId>(), Ok(action));
        }
    }

    #[test]
    fn test_parse_speed_command() {
        assert_eq!(
            VoiceCommand::parse("setScrollSpeed:2.5"),
            VoiceCommand::SetScrollSpeed(Some(2.5))
        );
        assert_eq!(
            VoiceCommand::parse("setScrollSpeed:fast"),
            VoiceCommand::SetScrollSpeed(None)
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            VoiceCommand::parse("launchRockets"),
            VoiceCommand::Unknown("launchRockets".to_string())
        );
    }

    #[test]
    fn test_voice_command_serializes_as_string() {
        let json = serde_json::to_string(&VoiceCommand::Action(ActionId::ZoomIn)).unwrap();
        assert_eq!(json, "\"zoomIn\"");

        let command: VoiceCommand = serde_json::from_str("\"setScrollSpeed:3\"").unwrap();
        assert_eq!(command, VoiceCommand::SetScrollSpeed(Some(3.0)));
    }
}
