//! Trigger phrase catalog
//!
//! The catalog is an ordered list of (action, phrases) entries. Order is
//! part of the matching contract: every classifier tier scans entries and
//! phrases front to back and the first hit wins.

use std::collections::HashSet;

use tracing::warn;

use super::action::ActionId;

/// One action and its trigger phrases, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub action: ActionId,
    pub phrases: Vec<String>,
}

/// Ordered mapping from action to trigger phrases
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    entries: Vec<CatalogEntry>,
}

impl CommandCatalog {
    /// Build a catalog from ordered entries
    ///
    /// Phrases are lowercased and trimmed. A phrase already registered by an
    /// earlier entry is dropped so exact matching stays unambiguous.
    pub fn new<I, P, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ActionId, P)>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut built: Vec<CatalogEntry> = Vec::new();

        for (action, phrases) in entries {
            let mut kept = Vec::new();
            for phrase in phrases {
                let phrase = phrase.as_ref().trim().to_lowercase();
                if phrase.is_empty() {
                    continue;
                }
                if !seen.insert(phrase.clone()) {
                    warn!(%action, %phrase, "duplicate trigger phrase ignored");
                    continue;
                }
                kept.push(phrase);
            }

            match built.iter_mut().find(|entry| entry.action == action) {
                Some(entry) => entry.phrases.extend(kept),
                None => built.push(CatalogEntry { action, phrases: kept }),
            }
        }

        Self { entries: built }
    }

    /// Entries in matching order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every (action, phrase) pair in matching order
    pub fn phrases(&self) -> impl Iterator<Item = (ActionId, &str)> {
        self.entries
            .iter()
            .flat_map(|entry| entry.phrases.iter().map(move |p| (entry.action, p.as_str())))
    }

    /// Trigger phrases registered for an action
    pub fn phrases_for(&self, action: ActionId) -> &[String] {
        self.entries
            .iter()
            .find(|entry| entry.action == action)
            .map(|entry| entry.phrases.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of phrases
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.phrases.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_PHRASES.iter().map(|(action, phrases)| (*action, phrases.iter())))
    }
}

const DEFAULT_PHRASES: &[(ActionId, &[&str])] = &[
    (
        ActionId::StartScrolling,
        &[
            "start scrolling", "begin scrolling", "auto scroll", "scroll", "start scroll",
            "begin scroll", "commence scrolling", "initiate scrolling", "activate scrolling",
            "start auto scroll", "begin auto scrolling",
        ],
    ),
    (
        ActionId::StopScrolling,
        &[
            "stop scrolling", "stop scroll", "halt scroll", "end scrolling", "cease scrolling",
            "disable scrolling", "turn off scrolling", "quit scrolling", "stop", "end",
            "stop auto scroll", "end auto scrolling", "disable scroll", "quit scroll",
        ],
    ),
    (
        ActionId::PauseScrolling,
        &[
            "pause scrolling", "pause scroll", "hold scroll", "suspend scrolling",
            "freeze scrolling", "halt temporarily", "pause", "pause auto scroll",
        ],
    ),
    (
        ActionId::ResumeScrolling,
        &[
            "resume scrolling", "continue scroll", "unpause scroll", "restart scrolling",
            "continue scrolling", "resume scroll", "resume", "continue", "unpause",
        ],
    ),
    (
        ActionId::IncreaseSpeed,
        &[
            "scroll faster", "speed up", "increase scroll speed", "faster", "accelerate",
            "increase speed", "speed up scrolling", "make it faster", "boost speed",
            "go faster", "scroll quicker", "quicken", "faster scrolling",
        ],
    ),
    (
        ActionId::DecreaseSpeed,
        &[
            "scroll slower", "slow down", "reduce scroll speed", "slower", "decelerate",
            "decrease speed", "slow down scrolling", "make it slower", "reduce speed",
            "go slower", "scroll more slowly", "slower scrolling",
        ],
    ),
    (
        ActionId::ScrollUp,
        &[
            "scroll up", "reverse", "go up", "upward", "scroll upward", "move up",
            "direction up", "scroll backwards", "reverse direction",
        ],
    ),
    (
        ActionId::ScrollDown,
        &[
            "scroll down", "normal direction", "go down", "downward", "scroll downward",
            "move down", "direction down", "scroll forward", "forward direction",
        ],
    ),
    (
        ActionId::GoToTop,
        &[
            "go to top", "top of page", "scroll to top", "page top", "jump to top",
            "beginning of page", "start of page", "top",
        ],
    ),
    (
        ActionId::GoToBottom,
        &[
            "go to bottom", "bottom of page", "scroll to bottom", "page bottom",
            "jump to bottom", "end of page", "bottom",
        ],
    ),
    (
        ActionId::LeftTab,
        &[
            "go to left tab", "left tab", "previous tab", "switch left", "tab left",
            "move to left tab", "switch to left tab", "go left", "previous",
        ],
    ),
    (
        ActionId::RightTab,
        &[
            "go to right tab", "right tab", "next tab", "switch right", "tab right",
            "move to right tab", "switch to right tab", "go right", "next",
        ],
    ),
    (
        ActionId::PauseVideo,
        &[
            "pause video", "pause the video", "stop video", "halt video",
            "freeze video", "pause current video", "video pause",
        ],
    ),
    (
        ActionId::PlayVideo,
        &[
            "play video", "resume video", "start video", "unpause video",
            "continue video", "play the video", "video play", "start the video",
        ],
    ),
    (
        ActionId::MaximizeVideo,
        &[
            "maximize video", "fullscreen video", "expand video", "full screen video",
            "make video fullscreen", "video fullscreen", "enlarge video",
        ],
    ),
    (
        ActionId::MinimizeVideo,
        &[
            "minimize video", "shrink video", "exit fullscreen", "close fullscreen",
            "reduce video", "small video", "normal video size",
        ],
    ),
    (
        ActionId::MaximizeWindow,
        &[
            "maximize window", "maximize browser", "maximize browser window",
            "fullscreen browser", "maximize", "expand window", "full screen",
            "make window bigger", "enlarge window",
        ],
    ),
    (
        ActionId::MinimizeWindow,
        &[
            "minimize window", "minimize browser", "minimize browser window",
            "shrink browser", "reduce window", "make window smaller", "minimize",
        ],
    ),
    (
        ActionId::StopListening,
        &[
            "stop listening", "stop voice", "disable voice", "turn off voice",
            "quit listening", "stop voice control", "disable listening",
        ],
    ),
    (
        ActionId::Goodbye,
        &["bye", "goodbye", "good bye", "see you later", "farewell", "stop everything"],
    ),
    (
        ActionId::GoBack,
        &[
            "go back", "back", "previous page", "history back", "navigate back",
            "return", "go to previous page", "backward",
        ],
    ),
    (
        ActionId::GoForward,
        &[
            "go forward", "forward", "next page", "history forward", "navigate forward",
            "advance", "go to next page",
        ],
    ),
    (
        ActionId::Refresh,
        &[
            "refresh", "reload", "refresh page", "reload page", "update page",
            "refresh the page", "reload the page",
        ],
    ),
    (
        ActionId::ZoomIn,
        &[
            "zoom in", "increase zoom", "zoom closer", "make bigger", "enlarge",
            "zoom up", "magnify",
        ],
    ),
    (
        ActionId::ZoomOut,
        &[
            "zoom out", "decrease zoom", "zoom farther", "make smaller", "shrink",
            "zoom back", "reduce zoom",
        ],
    ),
    (
        ActionId::FocusSearch,
        &[
            "focus search", "search bar", "focus on search", "search input",
            "search box", "go to search", "activate search", "find search",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_covers_every_action_in_order() {
        let catalog = CommandCatalog::default();
        let order: Vec<ActionId> = catalog.entries().iter().map(|e| e.action).collect();
        assert_eq!(order, ActionId::ALL.to_vec());
        assert!(catalog.entries().iter().all(|e| !e.phrases.is_empty()));
    }

    #[test]
    fn test_default_catalog_phrases_are_unique() {
        let catalog = CommandCatalog::default();
        let unique: HashSet<&str> = catalog.phrases().map(|(_, p)| p).collect();
        assert_eq!(unique.len(), catalog.len());
    }

    #[test]
    fn test_duplicate_phrase_first_registration_wins() {
        let catalog = CommandCatalog::new([
            (ActionId::StopScrolling, vec!["stop", "halt"]),
            (ActionId::PauseVideo, vec!["Stop ", "pause video"]),
        ]);
        assert_eq!(catalog.phrases_for(ActionId::StopScrolling), ["stop", "halt"]);
        assert_eq!(catalog.phrases_for(ActionId::PauseVideo), ["pause video"]);
    }

    #[test]
    fn test_phrases_are_normalized() {
        let catalog = CommandCatalog::new([(ActionId::ZoomIn, vec!["  Zoom IN  ", ""])]);
        assert_eq!(catalog.phrases_for(ActionId::ZoomIn), ["zoom in"]);
        assert_eq!(catalog.len(), 1);
    }
}
