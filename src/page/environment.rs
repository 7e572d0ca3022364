//! DOM-like collaborator a page acts upon

use thiserror::Error;

use crate::notice::Notice;

/// Failures from media element calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("playback was rejected")]
    PlaybackRejected,

    #[error("fullscreen request was rejected")]
    FullscreenRejected,

    #[error("leaving fullscreen failed")]
    ExitFullscreenFailed,
}

/// The best video candidate on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub paused: bool,
}

/// Scroll, media, navigation and rendering surface of one page
pub trait PageEnvironment: Send {
    fn scroll_by(&mut self, dy: f64);
    fn scroll_to_top(&mut self);
    fn scroll_to_bottom(&mut self);

    fn history_back(&mut self);
    fn history_forward(&mut self);
    fn reload(&mut self);

    fn zoom(&self) -> f64;
    fn set_zoom(&mut self, zoom: f64);

    /// Focus the first visible search input. `false` if there is none.
    fn focus_search(&mut self) -> bool;

    /// The video commands act upon, if any
    fn video(&self) -> Option<VideoInfo>;
    fn play_video(&mut self) -> Result<(), MediaError>;
    fn pause_video(&mut self);
    fn request_video_fullscreen(&mut self) -> Result<(), MediaError>;
    /// Stretch the video over the viewport without the fullscreen API
    fn set_video_fallback_maximized(&mut self, maximized: bool);
    fn is_fullscreen(&self) -> bool;
    fn exit_fullscreen(&mut self) -> Result<(), MediaError>;

    /// Show a transient notice, replacing the previous one
    fn show_notice(&mut self, notice: &Notice);
    /// Update the on-page status indicator
    fn render_status(&mut self, status: &str);
}
