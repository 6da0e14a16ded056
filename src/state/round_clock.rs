//! Round-level timing and the stage/lobby transition state machine.
//!
//! Records are shared between a stage and the lobby with the same number: the stage timer
//! of record `n` measures wave `n`, while its queue timer measures time spent in lobby `n`
//! before that wave starts.

use tracing::debug;

use crate::state::{stopwatch::Stopwatch, zones::RelativeOffset};

/// Highest stage number in a round.
pub const MAX_STAGE: u8 = 10;

/// Per-stage timing data, created lazily the first time a stage or lobby is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageRecord {
    /// Time spent inside the stage.
    pub stage_timer: Stopwatch,
    /// Time spent in the matching lobby before the stage.
    pub queue_timer: Stopwatch,
    /// Positioning quality of the transition feeding this stage.
    pub good_setup: bool,
    /// Times the matching lobby was entered from a stage this round.
    pub visits: u32,
    /// Position inside the lobby when it was entered.
    pub relative_offset: Option<RelativeOffset>,
}

impl StageRecord {
    fn on_tick(&mut self) {
        self.stage_timer.tick();
        self.queue_timer.tick();
    }

    fn stop(&mut self) {
        self.stage_timer.stop();
        self.queue_timer.stop();
    }

    /// Whether the matching lobby was entered more than once.
    pub fn was_reset(&self) -> bool {
        self.visits > 1
    }
}

/// Coarse view of where the observer was on the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    /// Neither in a stage nor in a lobby.
    Idle,
    /// Waiting in a lobby.
    InZone(u8),
    /// Playing a stage.
    InStage(u8),
}

/// Immutable copy of a round's timers handed to the telemetry worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockSnapshot {
    /// Round-level stopwatch.
    pub round: Stopwatch,
    /// Recorded stages in ascending order.
    pub stages: Vec<(u8, StageRecord)>,
}

/// Owns the round stopwatch and the per-stage records.
#[derive(Debug, Clone, Default)]
pub struct RoundClock {
    round: Stopwatch,
    records: [Option<StageRecord>; MAX_STAGE as usize],
    last_stage: u8,
    last_zone: u8,
}

impl RoundClock {
    /// Create an idle clock with no records.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(number: u8) -> Option<usize> {
        (1..=MAX_STAGE)
            .contains(&number)
            .then(|| usize::from(number - 1))
    }

    fn record_mut(&mut self, number: u8) -> Option<&mut StageRecord> {
        let index = Self::slot(number)?;
        Some(self.records[index].get_or_insert_with(StageRecord::default))
    }

    fn existing_mut(&mut self, number: u8) -> Option<&mut StageRecord> {
        let index = Self::slot(number)?;
        self.records[index].as_mut()
    }

    /// Record for `number`, if one has been created this round.
    pub fn record(&self, number: u8) -> Option<&StageRecord> {
        Self::slot(number).and_then(|index| self.records[index].as_ref())
    }

    /// Iterate over existing records in ascending order.
    pub fn records(&self) -> impl Iterator<Item = (u8, &StageRecord)> {
        self.records
            .iter()
            .zip(1..=MAX_STAGE)
            .filter_map(|(record, number)| record.as_ref().map(|record| (number, record)))
    }

    /// Round-level stopwatch.
    pub fn round_timer(&self) -> &Stopwatch {
        &self.round
    }

    /// Round time in seconds, offset-adjusted for the observer kind.
    pub fn round_seconds(&self, is_primary_observer: bool) -> f64 {
        self.round.elapsed_seconds(is_primary_observer)
    }

    /// Where the observer was on the last update.
    pub fn phase(&self) -> ClockPhase {
        match (self.last_stage, self.last_zone) {
            (0, 0) => ClockPhase::Idle,
            (0, zone) => ClockPhase::InZone(zone),
            (stage, _) => ClockPhase::InStage(stage),
        }
    }

    /// Arm the round stopwatch.
    pub fn start_round(&mut self) {
        self.round.start();
    }

    /// Whether the round stopwatch is counting.
    pub fn is_round_running(&self) -> bool {
        self.round.is_running()
    }

    /// Advance every running stopwatch by one tick.
    pub fn on_tick(&mut self) {
        self.round.tick();
        for record in self.records.iter_mut().flatten() {
            record.on_tick();
        }
    }

    /// Drop all records and return to idle.
    pub fn reset_all(&mut self) {
        self.round = Stopwatch::new();
        self.records = Default::default();
        self.last_stage = 0;
        self.last_zone = 0;
    }

    /// Freeze the round stopwatch and every stage and queue stopwatch.
    pub fn stop_all(&mut self) {
        self.round.stop();
        for record in self.records.iter_mut().flatten() {
            record.stop();
        }
    }

    /// Apply one tick's worth of stage/lobby observations.
    ///
    /// `current_stage` of 0 means the observer is not in a stage; `current_zone` of 0 means
    /// the observer is outside every lobby.
    pub fn update_state(
        &mut self,
        current_stage: u8,
        current_zone: u8,
        good_setup: bool,
        relative_offset: Option<RelativeOffset>,
    ) {
        let last_stage = self.last_stage;
        let last_zone = self.last_zone;

        if last_stage == 0 && current_stage > 0 {
            debug!(stage = current_stage, zone = last_zone, "lobby -> stage");
            if let Some(record) = self.record_mut(current_stage) {
                record.stage_timer.start();
            }
            if let Some(record) = self.existing_mut(last_zone) {
                record.queue_timer.stop();
            }
            // The setup seen now feeds the lobby that precedes the next stage.
            if current_stage < MAX_STAGE {
                if let Some(record) = self.record_mut(current_stage + 1) {
                    record.good_setup = good_setup;
                }
            }
        } else if last_stage > 0 && current_stage == 0 {
            debug!(stage = last_stage, zone = current_zone, "stage -> lobby");
            if let Some(record) = self.existing_mut(last_stage) {
                record.stage_timer.stop();
            }
            if let Some(record) = self.record_mut(current_zone) {
                record.queue_timer.start();
                if let Some(offset) = relative_offset {
                    record.relative_offset = Some(offset);
                }
                record.visits += 1;
            }
        }

        self.last_stage = current_stage;
        self.last_zone = current_zone;
    }

    /// Copy the timers so they can leave the tick thread.
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            round: self.round,
            stages: self
                .records()
                .map(|(number, record)| (number, *record))
                .collect(),
        }
    }

    /// Emit every record at debug level.
    pub fn log_records(&self) {
        if self.records().next().is_none() {
            debug!("no stage data recorded");
            return;
        }
        for (number, record) in self.records() {
            debug!(
                stage = number,
                stage_seconds = record.stage_timer.elapsed_seconds(true),
                queue_seconds = record.queue_timer.elapsed_seconds(true),
                good_setup = record.good_setup,
                visits = record.visits,
                offset = ?record.relative_offset,
                "stage record"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(clock: &mut RoundClock, stage: u8, zone: u8) {
        clock.update_state(stage, zone, false, None);
        clock.on_tick();
    }

    #[test]
    fn starts_idle_without_records() {
        let clock = RoundClock::new();
        assert_eq!(clock.phase(), ClockPhase::Idle);
        assert_eq!(clock.records().count(), 0);
    }

    #[test]
    fn lobby_then_stage_then_lobby() {
        let mut clock = RoundClock::new();
        clock.update_state(0, 3, false, None);
        assert_eq!(clock.phase(), ClockPhase::InZone(3));

        clock.update_state(1, 0, true, None);
        assert_eq!(clock.phase(), ClockPhase::InStage(1));
        assert!(clock.record(1).unwrap().stage_timer.is_running());
        // lobby 3 was never entered from a stage, so it has no queue timer
        assert!(clock.record(3).is_none());

        clock.update_state(0, 4, false, None);
        assert_eq!(clock.phase(), ClockPhase::InZone(4));
        assert!(!clock.record(1).unwrap().stage_timer.is_running());
        let lobby = clock.record(4).unwrap();
        assert!(lobby.queue_timer.is_running());
        assert_eq!(lobby.visits, 1);
        assert!(!lobby.was_reset());
    }

    #[test]
    fn entering_a_stage_seeds_next_stage_setup() {
        let mut clock = RoundClock::new();
        clock.update_state(0, 2, false, None);
        clock.update_state(2, 0, true, None);
        assert!(clock.record(3).unwrap().good_setup);
        assert!(!clock.record(2).unwrap().good_setup);
    }

    #[test]
    fn last_stage_does_not_seed_past_the_round() {
        let mut clock = RoundClock::new();
        clock.update_state(10, 0, true, None);
        assert_eq!(clock.records().map(|(n, _)| n).collect::<Vec<_>>(), vec![10]);
    }

    #[test]
    fn repeated_lobby_visit_marks_a_reset() {
        let mut clock = RoundClock::new();
        clock.update_state(1, 0, false, None);
        clock.update_state(0, 4, false, None);
        clock.update_state(1, 0, false, None);
        clock.update_state(0, 4, false, None);
        let lobby = clock.record(4).unwrap();
        assert_eq!(lobby.visits, 2);
        assert!(lobby.was_reset());
    }

    #[test]
    fn queue_timer_runs_until_next_stage() {
        let mut clock = RoundClock::new();
        clock.start_round();
        step(&mut clock, 1, 0);
        step(&mut clock, 0, 2);
        step(&mut clock, 0, 2);
        step(&mut clock, 0, 2);
        step(&mut clock, 2, 0);
        step(&mut clock, 2, 0);

        let lobby = clock.record(2).unwrap();
        assert_eq!(lobby.queue_timer.ticks(), 3);
        assert!(!lobby.queue_timer.is_running());
        assert_eq!(lobby.stage_timer.ticks(), 2);
        assert_eq!(clock.record(1).unwrap().stage_timer.ticks(), 1);
        assert_eq!(clock.round_timer().ticks(), 6);
    }

    #[test]
    fn relative_offset_is_stored_on_entered_lobby() {
        let mut clock = RoundClock::new();
        let offset = RelativeOffset { x: 2, y: 5 };
        clock.update_state(3, 0, false, None);
        clock.update_state(0, 4, false, Some(offset));
        assert_eq!(clock.record(4).unwrap().relative_offset, Some(offset));
    }

    #[test]
    fn leaving_a_stage_outside_any_lobby_records_nothing() {
        let mut clock = RoundClock::new();
        clock.update_state(5, 0, false, None);
        clock.update_state(0, 0, false, Some(RelativeOffset { x: 1, y: 1 }));
        assert_eq!(clock.phase(), ClockPhase::Idle);
        assert_eq!(clock.records().count(), 2);
    }

    #[test]
    fn stop_all_freezes_every_timer() {
        let mut clock = RoundClock::new();
        clock.start_round();
        step(&mut clock, 1, 0);
        step(&mut clock, 0, 2);
        clock.stop_all();
        let before = clock.snapshot();
        clock.on_tick();
        assert_eq!(clock.snapshot(), before);
        assert!(!clock.is_round_running());
    }

    #[test]
    fn reset_all_clears_records_and_last_observation() {
        let mut clock = RoundClock::new();
        clock.start_round();
        step(&mut clock, 1, 0);
        clock.reset_all();
        assert_eq!(clock.phase(), ClockPhase::Idle);
        assert_eq!(clock.records().count(), 0);
        assert_eq!(clock.round_timer().ticks(), 0);
        assert!(!clock.is_round_running());
    }

    #[test]
    fn out_of_range_numbers_are_ignored() {
        let mut clock = RoundClock::new();
        clock.update_state(11, 0, false, None);
        clock.update_state(0, 12, false, None);
        assert_eq!(clock.records().count(), 0);
    }
}
