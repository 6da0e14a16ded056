use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dto::telemetry::{SignedTokenRequest, TokenRequestBody};

type HmacSha256 = Hmac<Sha256>;

/// Base64 HMAC-SHA256 of `timestamp` followed by `nonce`.
pub fn sign(secret: &[u8], timestamp: &str, nonce: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(timestamp.as_bytes());
    mac.update(nonce.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build a token request for `submitter`, stamped at `now` with a fresh nonce.
pub fn signed_token_request(
    secret: &[u8],
    submitter: &str,
    now: OffsetDateTime,
) -> Result<SignedTokenRequest, InvalidLength> {
    let timestamp = (now.unix_timestamp_nanos() / 1_000_000).to_string();
    let nonce = Uuid::new_v4().to_string();
    let signature = sign(secret, &timestamp, &nonce)?;

    Ok(SignedTokenRequest {
        timestamp,
        nonce,
        signature,
        body: TokenRequestBody {
            description: submitter.to_string(),
        },
    })
}
