//! Browser host seam: tab enumeration, activation and window state

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a tab, and of the page instance living in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tab as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    pub active: bool,
}

/// Which neighbour to switch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabDirection {
    Left,
    Right,
}

/// State of the browser window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Minimized,
    Fullscreen,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowState::Normal => write!(f, "normal"),
            WindowState::Maximized => write!(f, "maximized"),
            WindowState::Minimized => write!(f, "minimized"),
            WindowState::Fullscreen => write!(f, "fullscreen"),
        }
    }
}

/// Errors from host operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("tab {0} not found")]
    TabNotFound(TabId),

    #[error("no current window")]
    NoWindow,

    #[error("host unavailable: {0}")]
    Unavailable(String),
}

/// Tab and window control provided by the browser
pub trait BrowserHost: Send + Sync {
    /// Tabs of the current window, in strip order
    fn tabs_in_current_window(&self) -> Result<Vec<TabInfo>, HostError>;

    /// Make `tab` the active tab. Activation is reported back as a host
    /// event, not by this call.
    fn activate_tab(&self, tab: TabId) -> Result<(), HostError>;

    fn window_state(&self) -> Result<WindowState, HostError>;

    fn set_window_state(&self, state: WindowState) -> Result<(), HostError>;
}

/// Lifecycle notifications raised by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Activated(TabId),
    Removed(TabId),
}

/// Index of the neighbouring tab with wraparound
pub fn adjacent_index(current: usize, len: usize, direction: TabDirection) -> usize {
    if len == 0 {
        return 0;
    }
    match direction {
        TabDirection::Left => (current + len - 1) % len,
        TabDirection::Right => (current + 1) % len,
    }
}
