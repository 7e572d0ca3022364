//! Voice command vocabulary and transcript classification
//!
//! Maps free-form spoken text onto a fixed set of discrete actions:
//! - `ActionId`: the enumerated actions a page can execute
//! - `CommandCatalog`: ordered trigger phrases per action
//! - `Classifier`: tiered exact / phrase / token matching

mod action;
mod catalog;
mod classifier;

pub use action::{ActionId, VoiceCommand, SET_SCROLL_SPEED_PREFIX};
pub use catalog::{CatalogEntry, CommandCatalog};
pub use classifier::{Classification, Classifier, MatchTier};
