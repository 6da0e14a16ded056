use futures::future::BoxFuture;

use crate::dao::error::ApiResult;
use crate::dto::telemetry::{RoundSubmission, SignedTokenRequest, TokenEnvelope};

#[cfg(feature = "http-transport")]
pub use self::http::HttpTelemetryApi;

/// Abstraction over the remote telemetry service.
pub trait TelemetryApi: Send + Sync {
    /// Exchange a signed request for a bearer token envelope.
    fn issue_token(&self, request: SignedTokenRequest) -> BoxFuture<'static, ApiResult<TokenEnvelope>>;
    /// Upload a completed round using `token` as bearer credentials.
    fn submit_round(
        &self,
        token: String,
        submission: RoundSubmission,
    ) -> BoxFuture<'static, ApiResult<()>>;
}

#[cfg(feature = "http-transport")]
mod http {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use reqwest::{Client, header::AUTHORIZATION};
    use tracing::debug;

    use super::TelemetryApi;
    use crate::dao::error::{ApiError, ApiResult};
    use crate::dto::telemetry::{RoundSubmission, SignedTokenRequest, TokenEnvelope};

    const HEADER_TIMESTAMP: &str = "X-Timestamp";
    const HEADER_NONCE: &str = "X-Nonce";
    const HEADER_SIGNATURE: &str = "X-Signature";

    /// [`TelemetryApi`] backed by `reqwest`.
    #[derive(Clone)]
    pub struct HttpTelemetryApi {
        client: Client,
        token_url: Arc<str>,
        rounds_url: Arc<str>,
    }

    impl HttpTelemetryApi {
        /// Build a client targeting the given issuer and submission endpoints.
        pub fn new(token_url: &str, rounds_url: &str) -> ApiResult<Self> {
            let client = Client::builder()
                .build()
                .map_err(|source| ApiError::ClientBuilder {
                    source: Box::new(source),
                })?;

            Ok(Self {
                client,
                token_url: Arc::from(token_url),
                rounds_url: Arc::from(rounds_url),
            })
        }
    }

    impl TelemetryApi for HttpTelemetryApi {
        fn issue_token(
            &self,
            request: SignedTokenRequest,
        ) -> BoxFuture<'static, ApiResult<TokenEnvelope>> {
            let api = self.clone();
            Box::pin(async move {
                let endpoint = api.token_url.to_string();
                let response = api
                    .client
                    .post(endpoint.as_str())
                    .header(HEADER_TIMESTAMP, &request.timestamp)
                    .header(HEADER_NONCE, &request.nonce)
                    .header(HEADER_SIGNATURE, &request.signature)
                    .json(&request.body)
                    .send()
                    .await
                    .map_err(|source| ApiError::send(endpoint.as_str(), source))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ApiError::RequestStatus {
                        endpoint,
                        status: status.as_u16(),
                    });
                }

                let raw = response
                    .text()
                    .await
                    .map_err(|source| ApiError::decode(endpoint.as_str(), source))?;
                debug!(%raw, "token issuer response");

                serde_json::from_str(&raw).map_err(|source| ApiError::decode(endpoint, source))
            })
        }

        fn submit_round(
            &self,
            token: String,
            submission: RoundSubmission,
        ) -> BoxFuture<'static, ApiResult<()>> {
            let api = self.clone();
            Box::pin(async move {
                let endpoint = api.rounds_url.to_string();
                let response = api
                    .client
                    .post(endpoint.as_str())
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .json(&submission)
                    .send()
                    .await
                    .map_err(|source| ApiError::send(endpoint.as_str(), source))?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(ApiError::RequestStatus {
                        endpoint,
                        status: response.status().as_u16(),
                    })
                }
            })
        }
    }
}
