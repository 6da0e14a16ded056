//! Services sitting between the host event stream and the telemetry endpoints.

/// Host event orchestration for a single observer.
pub mod round_tracker;
/// Token request signing.
pub mod signing;
/// Background round submission.
pub mod telemetry_service;
/// Bearer token caching with an expiry margin.
pub mod token_cache;
