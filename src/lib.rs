//! vocascroll: voice-driven page control
//!
//! Spoken transcripts are classified into actions and executed against
//! the page of the tab that heard them:
//! - Per-tab page instances own auto-scroll and speech recognition state
//! - A coordinator classifies commands, tracks the active tab and
//!   suspends background pages
//! - An IPC server lets observers (popup UI) query and drive the system

pub mod browser;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod ipc;
pub mod lifecycle;
pub mod notice;
pub mod page;
pub mod recognition;
pub mod scroll;
