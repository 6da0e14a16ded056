//! Replays a recorded host trace through the round tracker and uploads completed rounds.

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ba_round_tracker::{
    config::AppConfig,
    dao::telemetry_api::HttpTelemetryApi,
    dto::host::HostEvent,
    services::{
        round_tracker::{RoundSink, RoundTracker},
        telemetry_service::{ReporterSettings, TelemetryReporter},
    },
    state::SpatialZoneMap,
};

/// Environment variable naming the trace file when no argument is given.
const TRACE_ENV: &str = "BA_TRACKER_TRACE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let trace = trace_path().context("no trace file given (pass a path or set BA_TRACKER_TRACE)")?;

    let api = HttpTelemetryApi::new(&config.token_issuer_url, &config.submit_round_url)
        .context("building telemetry client")?;
    let reporter = TelemetryReporter::spawn(ReporterSettings::from(&config), Arc::new(api));
    let zones = SpatialZoneMap::new(config.lobbies.clone());
    if zones.is_empty() {
        warn!("no lobbies configured; queue times will not be recorded");
    } else {
        info!(lobbies = zones.len(), "lobby layout ready");
    }
    let mut tracker = RoundTracker::new(zones, reporter);

    info!(trace = %trace.display(), "replaying host trace");
    let outcome = tokio::select! {
        result = replay_trace(&mut tracker, &trace) => Some(result),
        () = shutdown_signal() => None,
    };

    let reporter = tracker.into_sink();
    match outcome {
        Some(result) => {
            // Let queued rounds finish uploading before exiting.
            reporter.close().await;
            let events = result?;
            info!(events, "trace replay finished");
        }
        None => {
            warn!("interrupted; dropping pending submissions");
            reporter.shutdown().await;
        }
    }

    Ok(())
}

fn trace_path() -> Option<PathBuf> {
    env::args_os()
        .nth(1)
        .or_else(|| env::var_os(TRACE_ENV))
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

/// Feed every JSON line of `path` to the tracker, skipping lines that do not parse.
async fn replay_trace<S: RoundSink>(
    tracker: &mut RoundTracker<S>,
    path: &Path,
) -> anyhow::Result<usize> {
    let file = File::open(path)
        .await
        .with_context(|| format!("opening trace {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_number = 0usize;
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await.context("reading trace")? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<HostEvent>(line) {
            Ok(event) => {
                tracker.handle(event);
                handled += 1;
            }
            Err(err) => warn!(line = line_number, error = %err, "skipping malformed host event"),
        }
    }

    Ok(handled)
}

/// Configure tracing using `RUST_LOG` if present, with a sensible default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,ba_round_tracker=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; listening for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
