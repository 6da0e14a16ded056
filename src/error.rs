//! Crate-level error types for the telemetry pipeline.

use thiserror::Error;

use crate::dao::error::ApiError;

/// Failures inside the telemetry worker. They are logged and never reach the tick path.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The token issuer could not be reached or answered with an error.
    #[error("failed to fetch API token")]
    TokenFetch(#[source] ApiError),
    /// The issuer's answer carried no token.
    #[error("token issuer returned no token")]
    MissingToken,
    /// The issuer's expiry timestamp could not be parsed.
    #[error("token issuer returned an invalid expiry `{raw}`")]
    InvalidExpiry {
        raw: String,
        #[source]
        source: time::error::Parse,
    },
    /// The signing key was rejected by the MAC.
    #[error("invalid signing secret")]
    Signing(#[from] hmac::digest::InvalidLength),
    /// The round upload failed.
    #[error("round submission failed")]
    Submission(#[source] ApiError),
}

/// Reasons a round was not queued for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    /// Submissions are turned off in the configuration.
    #[error("round submissions are disabled")]
    Disabled,
    /// The team did not match a known formation.
    #[error("round has no recognised formation")]
    UndefinedFormation,
    /// The worker queue is full.
    #[error("telemetry queue is full")]
    QueueFull,
    /// The worker has stopped.
    #[error("telemetry worker has stopped")]
    Closed,
}
