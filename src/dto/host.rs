use serde::{Deserialize, Serialize};

use crate::state::{
    roles::{ROSTER_SLOTS, RosterSlot},
    stage_policy::StageSignals,
    zones::WorldPoint,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of the roster widget: the leader slot first, then the four others.
pub struct RosterSnapshot {
    /// Name of the local participant.
    pub local_name: String,
    /// The five roster slots.
    pub slots: [RosterSlot; ROSTER_SLOTS],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Everything the host reports on a single tick.
pub struct TickSnapshot {
    /// World position of the local participant.
    pub position: WorldPoint,
    /// Signals gating whether a stage is active.
    #[serde(flatten)]
    pub signals: StageSignals,
    /// Positioning quality observed this tick.
    #[serde(default)]
    pub good_setup: bool,
    /// Roster widget contents, when it is open.
    #[serde(default)]
    pub roster: Option<RosterSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Events delivered by the host client, one JSON object per line in a trace.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// One game tick elapsed.
    Tick(TickSnapshot),
    /// The game announced the start of a stage.
    StageAnnounced {
        /// Announced stage number.
        stage: u8,
    },
    /// The team roster was opened or changed.
    RosterOpened,
    /// A role scroll was used on a participant.
    ScrollUsed,
    /// The role widget closed.
    RoleWidgetClosed,
    /// The round's completion signal was observed.
    RoundCompleted,
}
