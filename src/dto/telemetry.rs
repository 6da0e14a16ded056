use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

/// Layout of the `expires_at` field returned by the token issuer, always UTC.
const EXPIRY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// JSON body of a token request.
pub struct TokenRequestBody {
    /// Name of the participant asking for the token.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Signed token request ready to be sent.
pub struct SignedTokenRequest {
    /// Epoch milliseconds, sent as `X-Timestamp`.
    pub timestamp: String,
    /// Random nonce, sent as `X-Nonce`.
    pub nonce: String,
    /// Base64 HMAC-SHA256 of timestamp and nonce, sent as `X-Signature`.
    pub signature: String,
    /// Request body.
    pub body: TokenRequestBody,
}

#[derive(Debug, Clone, Deserialize)]
/// Envelope returned by the token issuer.
pub struct TokenEnvelope {
    /// Issuer status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Token payload; absent on failure.
    #[serde(default)]
    pub data: Option<TokenData>,
    /// Issuer error details.
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
/// Token payload inside [`TokenEnvelope`].
pub struct TokenData {
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Expiry as `yyyy-MM-ddTHH:mm:ss.ffffff` in UTC.
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Parse the issuer's expiry timestamp.
pub fn parse_expiry(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(raw, EXPIRY_FORMAT).map(PrimitiveDateTime::assume_utc)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// One participant in a round submission.
pub struct PlayerEntry {
    /// In-game display name.
    pub character_name: String,
    /// Final role label.
    pub role: String,
    /// Linking key, set only on the submitter's own entry.
    pub uuid_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// Timing data for one recorded stage.
pub struct WaveEntry {
    /// Stage number.
    pub wave_number: u8,
    /// Offset-adjusted stage time in seconds.
    pub wave_time: f64,
    /// Raw ticks spent in the lobby before the stage.
    pub qs_time: u32,
    /// Positioning quality of the transition into the stage.
    pub good_premove: bool,
    /// Whether the lobby was entered more than once.
    pub reset: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
/// JSON body of a round submission.
pub struct RoundSubmission {
    /// Formation tag.
    pub format: String,
    /// Offset-adjusted round time in seconds.
    pub round_time: f64,
    /// Name of the submitter.
    pub submitted_by: String,
    /// Whether the submitter led the team.
    pub scroller: bool,
    /// Team roster.
    pub players: Vec<PlayerEntry>,
    /// Per-stage timings.
    pub wave_data: Vec<WaveEntry>,
}
