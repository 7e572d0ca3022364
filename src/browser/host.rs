//! In-memory browser host: one window with an ordered tab strip

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::coordinator::{BrowserHost, HostError, HostEvent, TabId, TabInfo, WindowState};

#[derive(Debug, Default)]
struct HostState {
    tabs: Vec<TabInfo>,
    next_id: u32,
    window: WindowState,
}

/// Tab strip and window state kept in memory; lifecycle changes are
/// raised as [`HostEvent`]s
pub struct InMemoryHost {
    state: Mutex<HostState>,
    events: mpsc::UnboundedSender<HostEvent>,
}

impl InMemoryHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let host = Self {
            state: Mutex::new(HostState {
                next_id: 1,
                ..Default::default()
            }),
            events,
        };
        (host, rx)
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            debug!(?event, "no listener for host event");
        }
    }

    /// Append a tab to the strip without activating it
    pub fn open_tab(&self, url: impl Into<String>) -> TabId {
        let mut state = self.state();
        let id = TabId(state.next_id);
        state.next_id += 1;
        state.tabs.push(TabInfo {
            id,
            url: url.into(),
            active: false,
        });
        id
    }

    /// Remove a tab; if it was active, its right neighbour (or the new
    /// last tab) takes over
    pub fn close_tab(&self, tab: TabId) -> Result<(), HostError> {
        let successor = {
            let mut state = self.state();
            let index = state
                .tabs
                .iter()
                .position(|t| t.id == tab)
                .ok_or(HostError::TabNotFound(tab))?;
            let removed = state.tabs.remove(index);

            if removed.active && !state.tabs.is_empty() {
                let next = index.min(state.tabs.len() - 1);
                state.tabs[next].active = true;
                Some(state.tabs[next].id)
            } else {
                None
            }
        };

        self.emit(HostEvent::Removed(tab));
        if let Some(next) = successor {
            self.emit(HostEvent::Activated(next));
        }
        Ok(())
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.state().tabs.iter().find(|t| t.active).map(|t| t.id)
    }
}

impl BrowserHost for InMemoryHost {
    fn tabs_in_current_window(&self) -> Result<Vec<TabInfo>, HostError> {
        Ok(self.state().tabs.clone())
    }

    fn activate_tab(&self, tab: TabId) -> Result<(), HostError> {
        let changed = {
            let mut state = self.state();
            if !state.tabs.iter().any(|t| t.id == tab) {
                return Err(HostError::TabNotFound(tab));
            }
            let mut changed = false;
            for info in state.tabs.iter_mut() {
                let active = info.id == tab;
                changed |= active && !info.active;
                info.active = active;
            }
            changed
        };

        if changed {
            self.emit(HostEvent::Activated(tab));
        }
        Ok(())
    }

    fn window_state(&self) -> Result<WindowState, HostError> {
        Ok(self.state().window)
    }

    fn set_window_state(&self, window: WindowState) -> Result<(), HostError> {
        self.state().window = window;
        Ok(())
    }
}
