//! Events module for observer notifications
//!
//! The coordinator broadcasts these whenever the process-wide view
//! changes, so observers such as the popup can mirror page state.

use serde::{Deserialize, Serialize};

use crate::commands::ActionId;
use crate::coordinator::TabId;
use crate::scroll::ScrollState;

/// Events emitted by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// A page reported a new scroll state
    ScrollStateChanged {
        /// Reporting tab, if the update came from a page
        tab_id: Option<TabId>,
        state: ScrollState,
    },

    /// A different tab became active
    ActiveTabChanged { tab_id: TabId },

    /// A tab was closed
    TabClosed { tab_id: TabId },

    /// A transcript was classified on behalf of a tab
    CommandResolved {
        tab_id: TabId,
        transcript: String,
        /// `None` when nothing in the catalog matched
        action: Option<ActionId>,
    },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::ScrollStateChanged { tab_id, state } => {
                let origin = tab_id.map(|t| t.to_string()).unwrap_or_else(|| "-".into());
                write!(
                    f,
                    "SCROLL_STATE_CHANGED (tab {}, active={}, paused={}, speed={:.1})",
                    origin, state.active, state.paused, state.speed
                )
            }
            StateEvent::ActiveTabChanged { tab_id } => write!(f, "ACTIVE_TAB_CHANGED ({})", tab_id),
            StateEvent::TabClosed { tab_id } => write!(f, "TAB_CLOSED ({})", tab_id),
            StateEvent::CommandResolved { tab_id, action, .. } => match action {
                Some(action) => write!(f, "COMMAND_RESOLVED (tab {}, {})", tab_id, action),
                None => write!(f, "COMMAND_UNMATCHED (tab {})", tab_id),
            },
        }
    }
}
