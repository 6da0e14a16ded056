//! Access to the remote telemetry service.

/// Transport error types.
pub mod error;
/// Remote telemetry service access.
pub mod telemetry_api;
