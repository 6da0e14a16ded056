//! Background upload of completed rounds.
//!
//! The tick thread only ever hands over an owned [`RoundReport`]; a single worker task owns
//! the token cache and performs the token fetch and round upload one job at a time.

use std::{sync::Arc, time::Duration};

use indexmap::IndexMap;
use time::OffsetDateTime;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dao::telemetry_api::TelemetryApi,
    dto::telemetry::{PlayerEntry, RoundSubmission, WaveEntry, parse_expiry},
    error::{SubmitRejected, TelemetryError},
    services::{
        signing::signed_token_request,
        token_cache::{CachedToken, TokenCache},
    },
    state::{ClockSnapshot, Formation, RoleLabel},
};

/// How long [`TelemetryReporter::shutdown`] waits for an in-flight upload.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Everything needed to submit one round, detached from the live tick state.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// Team roster in slot order.
    pub roster: IndexMap<String, RoleLabel>,
    /// Detected formation; rounds without one are never submitted.
    pub formation: Option<Formation>,
    /// Frozen round timers.
    pub clock: ClockSnapshot,
    /// Whether the submitter led the team.
    pub is_leader: bool,
    /// Name of the local participant.
    pub submitted_by: String,
}

#[derive(Debug)]
struct RoundJob {
    formation: Formation,
    report: RoundReport,
}

/// Settings the reporter needs from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ReporterSettings {
    /// Whether submissions are enabled.
    pub submit_runs: bool,
    /// Linking key attached to the submitter's entry.
    pub uuid_key: Option<String>,
    /// Shared secret used to sign token requests.
    pub signing_secret: String,
    /// Bound of the job queue.
    pub queue_capacity: usize,
}

impl From<&AppConfig> for ReporterSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            submit_runs: config.submit_runs,
            uuid_key: config.uuid_key.clone(),
            signing_secret: config.signing_secret.clone(),
            queue_capacity: config.queue_capacity,
        }
    }
}

/// Handle used by the tick thread to queue completed rounds.
pub struct TelemetryReporter {
    submit_runs: bool,
    jobs: mpsc::Sender<RoundJob>,
    shutdown: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl TelemetryReporter {
    /// Spawn the worker task on the current Tokio runtime.
    pub fn spawn(settings: ReporterSettings, api: Arc<dyn TelemetryApi>) -> Self {
        Self::spawn_with_token(settings, api, None)
    }

    /// Spawn the worker with a token already in its cache.
    pub fn spawn_with_token(
        settings: ReporterSettings,
        api: Arc<dyn TelemetryApi>,
        token: Option<CachedToken>,
    ) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel(settings.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            api,
            cache: TokenCache::new(token),
            signing_secret: settings.signing_secret.into_bytes(),
            uuid_key: settings.uuid_key,
        };
        let worker = tokio::spawn(worker.run(jobs_rx, shutdown_rx));

        Self {
            submit_runs: settings.submit_runs,
            jobs: jobs_tx,
            shutdown: shutdown_tx,
            worker,
        }
    }

    /// Queue a completed round without waiting for any network work.
    pub fn submit_round(&self, report: RoundReport) -> Result<(), SubmitRejected> {
        if !self.submit_runs {
            debug!("round submissions are disabled; skipping");
            return Err(SubmitRejected::Disabled);
        }
        let Some(formation) = report.formation else {
            debug!("round has no recognised formation; skipping");
            return Err(SubmitRejected::UndefinedFormation);
        };

        self.jobs
            .try_send(RoundJob { formation, report })
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("telemetry queue full; dropping round");
                    SubmitRejected::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!("telemetry worker stopped; dropping round");
                    SubmitRejected::Closed
                }
            })
    }

    /// Stop accepting rounds and wait for every queued round to be processed.
    pub async fn close(self) {
        let Self {
            jobs,
            shutdown,
            worker,
            ..
        } = self;
        drop(jobs);
        if let Err(err) = worker.await {
            warn!(error = %err, "telemetry worker ended abnormally");
        }
        drop(shutdown);
    }

    /// Stop the worker, dropping queued rounds; an in-flight upload gets a short grace period.
    pub async fn shutdown(self) {
        let Self {
            jobs,
            shutdown,
            mut worker,
            ..
        } = self;
        let _ = shutdown.send(true);
        drop(jobs);
        if timeout(SHUTDOWN_GRACE, &mut worker).await.is_err() {
            warn!("telemetry worker did not stop in time; aborting in-flight upload");
            worker.abort();
        }
    }
}

struct Worker {
    api: Arc<dyn TelemetryApi>,
    cache: TokenCache,
    signing_secret: Vec<u8>,
    uuid_key: Option<String>,
}

impl Worker {
    async fn run(mut self, mut jobs: mpsc::Receiver<RoundJob>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!(dropped = jobs.len(), "telemetry worker shutting down");
                    break;
                }
                job = jobs.recv() => {
                    let Some(job) = job else { break };
                    if let Err(err) = self.process(job).await {
                        warn!(error = %err, details = ?err, "failed during token check or round submission");
                    }
                }
            }
        }
    }

    async fn process(&mut self, job: RoundJob) -> Result<(), TelemetryError> {
        let token = self.ensure_token(&job.report.submitted_by).await?;
        let submission = build_submission(job.formation, &job.report, self.uuid_key.as_deref());

        self.api
            .submit_round(token, submission)
            .await
            .map_err(TelemetryError::Submission)?;
        info!(
            formation = %job.formation,
            submitted_by = %job.report.submitted_by,
            "successfully submitted round"
        );
        Ok(())
    }

    async fn ensure_token(&mut self, submitter: &str) -> Result<String, TelemetryError> {
        let now = OffsetDateTime::now_utc();
        if let Some(token) = self.cache.usable(now) {
            return Ok(token.to_owned());
        }

        info!("API token invalid or expired; fetching a new one");
        let request = signed_token_request(&self.signing_secret, submitter, now)?;
        let envelope = self
            .api
            .issue_token(request)
            .await
            .map_err(TelemetryError::TokenFetch)?;

        let data = envelope.data.ok_or(TelemetryError::MissingToken)?;
        let token = data
            .token
            .filter(|token| !token.is_empty())
            .ok_or(TelemetryError::MissingToken)?;
        let raw_expiry = data.expires_at.unwrap_or_default();
        let expires_at = parse_expiry(&raw_expiry).map_err(|source| {
            TelemetryError::InvalidExpiry {
                raw: raw_expiry.clone(),
                source,
            }
        })?;

        self.cache.store(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}

/// Build the wire payload for a round.
pub fn build_submission(
    formation: Formation,
    report: &RoundReport,
    uuid_key: Option<&str>,
) -> RoundSubmission {
    let players = report
        .roster
        .iter()
        .map(|(name, label)| PlayerEntry {
            character_name: name.clone(),
            role: label.to_string(),
            uuid_key: uuid_key
                .filter(|_| *name == report.submitted_by)
                .map(str::to_owned),
        })
        .collect();

    let wave_data = report
        .clock
        .stages
        .iter()
        .map(|(number, record)| WaveEntry {
            wave_number: *number,
            wave_time: record.stage_timer.elapsed_seconds(false),
            qs_time: record.queue_timer.ticks(),
            good_premove: record.good_setup,
            reset: record.was_reset(),
        })
        .collect();

    RoundSubmission {
        format: formation.as_str().to_string(),
        round_time: report.clock.round.elapsed_seconds(report.is_leader),
        submitted_by: report.submitted_by.clone(),
        scroller: report.is_leader,
        players,
        wave_data,
    }
}
