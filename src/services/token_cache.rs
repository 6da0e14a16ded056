use time::{Duration, OffsetDateTime};

/// Tokens are refreshed this long before they actually expire.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(30);

/// Bearer token issued by the telemetry service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// Opaque bearer token.
    pub token: String,
    /// Absolute expiry instant.
    pub expires_at: OffsetDateTime,
}

impl CachedToken {
    /// Whether the token can still be used at `now`, keeping the safety margin.
    pub fn is_usable_at(&self, now: OffsetDateTime) -> bool {
        !self.token.is_empty()
            && self
                .expires_at
                .checked_sub(EXPIRY_MARGIN)
                .is_some_and(|refresh_at| now < refresh_at)
    }
}

/// Single-slot token cache owned by the telemetry worker.
#[derive(Debug, Default)]
pub struct TokenCache {
    cached: Option<CachedToken>,
}

impl TokenCache {
    /// Start with an optional pre-issued token.
    pub fn new(initial: Option<CachedToken>) -> Self {
        Self { cached: initial }
    }

    /// Token usable at `now`, if any.
    pub fn usable(&self, now: OffsetDateTime) -> Option<&str> {
        self.cached
            .as_ref()
            .filter(|cached| cached.is_usable_at(now))
            .map(|cached| cached.token.as_str())
    }

    /// Replace the cached token.
    pub fn store(&mut self, token: CachedToken) {
        self.cached = Some(token);
    }
}
