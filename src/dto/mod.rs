//! Data exchanged with the outside world: host events in, telemetry payloads out.

pub mod host;
pub mod telemetry;
