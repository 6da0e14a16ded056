use serde::{Deserialize, Serialize};

use crate::state::round_clock::MAX_STAGE;

/// Host signals that decide whether the observer is playing a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSignals {
    /// Observer is inside the instanced minigame area.
    pub in_instance: bool,
    /// A role-specific inventory item is present.
    pub role_item: bool,
    /// A role-specific interface element is shown.
    pub role_interface: bool,
    /// The host flagged an in-game session earlier.
    pub in_game_session: bool,
}

impl StageSignals {
    /// Whether the signals confirm an active stage.
    pub fn stage_active(&self) -> bool {
        self.in_instance && (self.role_item || self.role_interface || self.in_game_session)
    }
}

/// Stage number to feed the round clock: the announced stage when active and in range, else 0.
pub fn current_stage(announced: u8, signals: &StageSignals) -> u8 {
    if signals.stage_active() && (1..=MAX_STAGE).contains(&announced) {
        announced
    } else {
        0
    }
}
