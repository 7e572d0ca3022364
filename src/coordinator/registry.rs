//! Process-wide registry
//!
//! Created at startup and never persisted. Only the coordinator mutates it.

use std::collections::BTreeMap;

use crate::page::PageLink;
use crate::scroll::{ScrollState, ScrollStatePatch};

use super::host::TabId;

/// Known pages plus the aggregate view observers read
#[derive(Debug, Default)]
pub struct Registry {
    active_tab_id: Option<TabId>,
    last_known_scroll_state: ScrollState,
    pages: BTreeMap<TabId, PageLink>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.active_tab_id
    }

    pub fn last_known_scroll_state(&self) -> ScrollState {
        self.last_known_scroll_state
    }

    pub fn register(&mut self, link: PageLink) -> Option<PageLink> {
        self.pages.insert(link.tab_id(), link)
    }

    /// Forget a page; clears the active tab if it was this one
    pub fn unregister(&mut self, tab: TabId) -> Option<PageLink> {
        if self.active_tab_id == Some(tab) {
            self.active_tab_id = None;
        }
        self.pages.remove(&tab)
    }

    /// Record `tab` as active and return the previous active tab
    pub fn activate(&mut self, tab: TabId) -> Option<TabId> {
        self.active_tab_id.replace(tab)
    }

    pub fn link(&self, tab: TabId) -> Option<PageLink> {
        self.pages.get(&tab).cloned()
    }

    /// Links of every page except `tab`, in tab order
    pub fn links_except(&self, tab: TabId) -> Vec<PageLink> {
        self.pages
            .iter()
            .filter(|(id, _)| **id != tab)
            .map(|(_, link)| link.clone())
            .collect()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.pages.keys().copied().collect()
    }

    /// Whether an update from `origin` should move the aggregate state
    pub fn tracks(&self, origin: Option<TabId>) -> bool {
        match (origin, self.active_tab_id) {
            (None, _) | (_, None) => true,
            (Some(origin), Some(active)) => origin == active,
        }
    }

    pub fn merge_scroll_state(&mut self, patch: &ScrollStatePatch) -> ScrollState {
        self.last_known_scroll_state.apply(patch);
        self.last_known_scroll_state
    }
}
