//! Page instances
//!
//! One `PageInstance` runs per tab as its own task. It exclusively owns
//! that tab's scroll machine and recognition session and talks to the
//! coordinator only through messages.

mod environment;
mod indicator;
mod instance;
mod link;
mod shortcut;

pub use environment::{MediaError, PageEnvironment, VideoInfo};
pub use indicator::status_text;
pub use instance::{PageInstance, PageSettings, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
pub use link::{PageLink, PageMessage, PageReply, PageRequest, RelayError};
pub use shortcut::{Key, TripleTap};
