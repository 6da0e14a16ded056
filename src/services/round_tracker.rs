//! Host-facing orchestration: turns host events into round clock updates, role scans and
//! telemetry submissions.

use tracing::{debug, info};

use crate::{
    dto::host::{HostEvent, TickSnapshot},
    error::SubmitRejected,
    services::telemetry_service::{RoundReport, TelemetryReporter},
    state::{
        RoleInferenceEngine, RoundClock, SpatialZoneMap, stage_policy::current_stage,
        stopwatch::format_elapsed, zones::NO_ZONE,
    },
};

/// Destination for completed rounds.
pub trait RoundSink {
    /// Hand over a completed round without blocking.
    fn submit_round(&self, report: RoundReport) -> Result<(), SubmitRejected>;
}

impl RoundSink for TelemetryReporter {
    fn submit_round(&self, report: RoundReport) -> Result<(), SubmitRejected> {
        TelemetryReporter::submit_round(self, report)
    }
}

/// Tick-thread state for one observer.
pub struct RoundTracker<S> {
    zones: SpatialZoneMap,
    clock: RoundClock,
    roles: RoleInferenceEngine,
    scanning: bool,
    announced_stage: u8,
    local_name: Option<String>,
    sink: S,
}

impl<S: RoundSink> RoundTracker<S> {
    /// Create a tracker over the given lobby layout.
    pub fn new(zones: SpatialZoneMap, sink: S) -> Self {
        Self {
            zones,
            clock: RoundClock::new(),
            roles: RoleInferenceEngine::new(),
            scanning: false,
            announced_stage: 0,
            local_name: None,
            sink,
        }
    }

    /// Round clock state.
    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    /// Role inference state.
    pub fn roles(&self) -> &RoleInferenceEngine {
        &self.roles
    }

    /// Whether a role scan is armed.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Give back the sink, e.g. to drain it.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process one host event.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Tick(tick) => self.on_tick(tick),
            HostEvent::StageAnnounced { stage } => self.on_stage_announced(stage),
            HostEvent::RosterOpened | HostEvent::ScrollUsed => self.scanning = true,
            HostEvent::RoleWidgetClosed => self.scanning = false,
            HostEvent::RoundCompleted => self.on_round_completed(),
        }
    }

    fn on_stage_announced(&mut self, stage: u8) {
        self.announced_stage = stage;
        if stage == 1 {
            info!("new round started");
            self.clock.reset_all();
            self.clock.start_round();
        }
    }

    fn on_tick(&mut self, tick: TickSnapshot) {
        if let Some(roster) = tick.roster.as_ref() {
            self.local_name = Some(roster.local_name.clone());
            if self.scanning && self.roles.scan(&roster.slots, &roster.local_name).is_some() {
                self.scanning = false;
            }
        }

        let stage = current_stage(self.announced_stage, &tick.signals);
        let zone = self.zones.classify(tick.position);
        let is_leader = self.roles.current().is_some_and(|roles| roles.is_leader);
        let offset = if is_leader && zone != NO_ZONE {
            self.zones.relative_offset(tick.position, zone)
        } else {
            None
        };

        self.clock.update_state(stage, zone, tick.good_setup, offset);
        self.clock.on_tick();
    }

    fn on_round_completed(&mut self) {
        if !self.clock.is_round_running() {
            debug!("round completion seen without a running round; ignoring");
            return;
        }

        self.clock.stop_all();
        self.clock.log_records();

        let assignment = self.roles.current();
        let is_leader = assignment.is_some_and(|roles| roles.is_leader);
        info!(
            round_time = %format_elapsed(self.clock.round_seconds(is_leader)),
            role = ?assignment.and_then(|roles| roles.local_role).map(|label| label.to_string()),
            "round completed"
        );

        let report = RoundReport {
            roster: assignment
                .map(|roles| roles.roster.clone())
                .unwrap_or_default(),
            formation: assignment.and_then(|roles| roles.formation),
            clock: self.clock.snapshot(),
            is_leader,
            submitted_by: self.local_name.clone().unwrap_or_default(),
        };
        if let Err(reason) = self.sink.submit_round(report) {
            debug!(%reason, "round not queued for submission");
        }
    }
}
