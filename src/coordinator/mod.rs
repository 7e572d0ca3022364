//! Cross-context coordinator
//!
//! Owns the process-wide registry (active tab, last known scroll state,
//! known pages) and mediates every exchange between page instances:
//! - Tab lifecycle: suspend every other page, resume the activated one
//! - Command relay: classify transcripts and hand actions back to pages
//! - Tab/window control: pass-through to the browser host

mod service;
mod host;
mod registry;

pub use service::{Coordinator, CoordinatorHandle, Delivery, Envelope};
pub use host::{
    adjacent_index, BrowserHost, HostError, HostEvent, TabDirection, TabId, TabInfo, WindowState,
};
pub use registry::Registry;
