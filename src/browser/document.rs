//! Headless page document
//!
//! Shared behind a mutex so a clone held outside the page task can observe
//! what the page did.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::notice::Notice;
use crate::page::{MediaError, PageEnvironment, VideoInfo};

/// History and reload calls made by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back,
    Forward,
    Reload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVideo {
    pub paused: bool,
    pub fullscreen_allowed: bool,
    pub fallback_maximized: bool,
}

/// Observable document state
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentState {
    pub url: String,
    pub scroll_y: f64,
    pub page_height: f64,
    pub viewport_height: f64,
    pub zoom: f64,
    pub navigations: Vec<Navigation>,
    pub has_search_input: bool,
    pub search_focused: bool,
    pub video: Option<HeadlessVideo>,
    pub fullscreen: bool,
    pub notices: Vec<Notice>,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    state: Arc<Mutex<DocumentState>>,
}

impl HeadlessDocument {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DocumentState {
                url: url.into(),
                scroll_y: 0.0,
                page_height: 10_000.0,
                viewport_height: 800.0,
                zoom: 1.0,
                navigations: Vec::new(),
                has_search_input: false,
                search_focused: false,
                video: None,
                fullscreen: false,
                notices: Vec::new(),
                status: String::new(),
            })),
        }
    }

    pub fn with_video(self, paused: bool) -> Self {
        self.state().video = Some(HeadlessVideo {
            paused,
            fullscreen_allowed: true,
            fallback_maximized: false,
        });
        self
    }

    pub fn with_search_input(self) -> Self {
        self.state().has_search_input = true;
        self
    }

    /// Deny the fullscreen API so maximize falls back to styling
    pub fn deny_fullscreen(self) -> Self {
        if let Some(video) = self.state().video.as_mut() {
            video.fullscreen_allowed = false;
        }
        self
    }

    pub fn snapshot(&self) -> DocumentState {
        self.state().clone()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.state().notices.last().cloned()
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn max_scroll(state: &DocumentState) -> f64 {
        (state.page_height - state.viewport_height).max(0.0)
    }
}

impl PageEnvironment for HeadlessDocument {
    fn scroll_by(&mut self, dy: f64) {
        let mut state = self.state();
        let max = Self::max_scroll(&state);
        state.scroll_y = (state.scroll_y + dy).clamp(0.0, max);
    }

    fn scroll_to_top(&mut self) {
        self.state().scroll_y = 0.0;
    }

    fn scroll_to_bottom(&mut self) {
        let mut state = self.state();
        state.scroll_y = Self::max_scroll(&state);
    }

    fn history_back(&mut self) {
        self.state().navigations.push(Navigation::Back);
    }

    fn history_forward(&mut self) {
        self.state().navigations.push(Navigation::Forward);
    }

    fn reload(&mut self) {
        self.state().navigations.push(Navigation::Reload);
    }

    fn zoom(&self) -> f64 {
        self.state().zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.state().zoom = zoom;
    }

    fn focus_search(&mut self) -> bool {
        let mut state = self.state();
        state.search_focused = state.has_search_input;
        state.search_focused
    }

    fn video(&self) -> Option<VideoInfo> {
        self.state()
            .video
            .as_ref()
            .map(|v| VideoInfo { paused: v.paused })
    }

    fn play_video(&mut self) -> Result<(), MediaError> {
        match self.state().video.as_mut() {
            Some(video) => {
                video.paused = false;
                Ok(())
            }
            None => Err(MediaError::PlaybackRejected),
        }
    }

    fn pause_video(&mut self) {
        if let Some(video) = self.state().video.as_mut() {
            video.paused = true;
        }
    }

    fn request_video_fullscreen(&mut self) -> Result<(), MediaError> {
        let mut state = self.state();
        let allowed = state.video.as_ref().is_some_and(|v| v.fullscreen_allowed);
        if !allowed {
            return Err(MediaError::FullscreenRejected);
        }
        state.fullscreen = true;
        Ok(())
    }

    fn set_video_fallback_maximized(&mut self, maximized: bool) {
        if let Some(video) = self.state().video.as_mut() {
            video.fallback_maximized = maximized;
        }
    }

    fn is_fullscreen(&self) -> bool {
        self.state().fullscreen
    }

    fn exit_fullscreen(&mut self) -> Result<(), MediaError> {
        let mut state = self.state();
        if !state.fullscreen {
            return Err(MediaError::ExitFullscreenFailed);
        }
        state.fullscreen = false;
        Ok(())
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.state().notices.push(notice.clone());
    }

    fn render_status(&mut self, status: &str) {
        self.state().status = status.to_string();
    }
}
