//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.
//! Requests are tagged by `action`; every response carries `success`.

use serde::{Deserialize, Serialize};

use crate::commands::{ActionId, VoiceCommand};
use crate::coordinator::{TabDirection, TabId};
use crate::page::Key;
use crate::recognition::EngineError;
use crate::scroll::{ScrollState, ScrollStatePatch};

/// Requests handled by the coordinator
///
/// Pages send the first group as their origin tab; observers such as the
/// popup send them with an explicit `tabId` or act on the active tab.
/// The remaining requests drive the headless browser host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Classify a raw transcript and execute it on the originating tab
    ExecuteCommand {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
    },

    /// Execute an already resolved command. A command arriving within the
    /// page's debounce window answers `error: "command debounced"`.
    ExecuteVoiceCommand {
        command: VoiceCommand,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_command: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
    },

    /// Merge a partial state into the last known scroll state
    UpdateScrollState {
        #[serde(default)]
        state: ScrollStatePatch,
    },

    /// Last known scroll state, or a specific tab's live state
    GetScrollState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
    },

    SwitchTab {
        direction: TabDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
    },

    MaximizeWindow,

    MinimizeWindow,

    GetActiveTabId,

    /// Toggle voice recognition on a tab (active tab by default)
    ToggleRecording {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
    },

    OpenTab { url: String },

    CloseTab { tab_id: TabId },

    ActivateTab { tab_id: TabId },

    /// Feed a final transcript into a tab's recognition stream
    Transcript { tab_id: TabId, text: String },

    SetVisibility { tab_id: TabId, visible: bool },

    PressKey { tab_id: TabId, key: Key },

    /// Make a tab's speech engine fail with `error`, followed by `end`
    FailEngine { tab_id: TabId, error: EngineError },

    /// Ping to check connectivity
    Ping,

    /// Turn this connection into a push stream of state events
    Subscribe,
}

/// Response to any request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_state: Option<ScrollState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab_id: Option<TabId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: Option<ActionId>) -> Self {
        self.action = action;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_scroll_state(mut self, state: ScrollState) -> Self {
        self.scroll_state = Some(state);
        self
    }

    pub fn with_tab_id(mut self, tab_id: TabId) -> Self {
        self.tab_id = Some(tab_id);
        self
    }
}
