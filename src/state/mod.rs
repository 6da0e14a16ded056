//! Tick-driven domain state: timers, lobbies, the round clock and role inference.
//!
//! Nothing in here blocks or performs I/O; every operation runs on the host's tick thread.

pub mod roles;
pub mod round_clock;
pub mod stage_policy;
pub mod stopwatch;
pub mod zones;

pub use self::roles::{Formation, Role, RoleAssignment, RoleInferenceEngine, RoleLabel, RosterSlot};
pub use self::round_clock::{ClockPhase, ClockSnapshot, RoundClock, StageRecord};
pub use self::stopwatch::Stopwatch;
pub use self::zones::{RelativeOffset, SpatialZoneMap, WorldPoint, ZoneOrigin};
