//! Error types shared by telemetry API transports.

use std::error::Error;

use thiserror::Error;

/// Boxed transport-specific failure.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Convenient result alias returning [`ApiError`] failures.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures that can occur while talking to the telemetry service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build telemetry HTTP client")]
    ClientBuilder {
        #[source]
        source: BoxError,
    },
    /// The request could not be sent.
    #[error("failed to send telemetry request to `{endpoint}`")]
    RequestSend {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// The service answered with a non-success status.
    #[error("unexpected telemetry response status {status} for `{endpoint}`")]
    RequestStatus { endpoint: String, status: u16 },
    /// The response body could not be decoded.
    #[error("failed to decode telemetry response for `{endpoint}`")]
    DecodeResponse {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

impl ApiError {
    /// Construct a send failure from any backend error.
    pub fn send(endpoint: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ApiError::RequestSend {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// Construct a decode failure from any backend error.
    pub fn decode(endpoint: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ApiError::DecodeResponse {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }
}
