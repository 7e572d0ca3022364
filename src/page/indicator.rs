//! Status indicator text

use crate::scroll::{Direction, ScrollState};

/// Indicator text for the current page state
pub fn status_text(scroll: &ScrollState, listening: bool) -> String {
    if listening {
        return "Listening...".to_string();
    }
    if !scroll.active {
        return "Ready".to_string();
    }
    if scroll.paused {
        return format!("Paused ({:.1}px/tick)", scroll.speed);
    }
    let arrow = match scroll.direction {
        Direction::Forward => '↓',
        Direction::Backward => '↑',
    };
    format!("{} {:.1}px/tick", arrow, scroll.speed)
}
