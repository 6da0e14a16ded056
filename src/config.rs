//! Application-level configuration loading, including the lobby layout and telemetry settings.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::zones::{ZoneOrigin, default_lobbies};

/// Default location on disk where the tracker looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/tracker.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BA_TRACKER_CONFIG_PATH";
/// Environment variable toggling round submissions.
const SUBMIT_RUNS_ENV: &str = "BA_TRACKER_SUBMIT_RUNS";
/// Environment variable carrying the submitter's linking key.
const UUID_KEY_ENV: &str = "BA_TRACKER_UUID_KEY";

const DEFAULT_TOKEN_ISSUER_URL: &str =
    "https://osrs-ba-api-7f97e40f532b.herokuapp.com/api/v1/tokens/public/";
const DEFAULT_SUBMIT_ROUND_URL: &str =
    "https://osrs-ba-api-7f97e40f532b.herokuapp.com/api/v1/rounds/";
const DEFAULT_SIGNING_SECRET: &str = "ba-4-all";
const DEFAULT_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Whether completed rounds are uploaded.
    pub submit_runs: bool,
    /// Key linking the submitter's entry to their account.
    pub uuid_key: Option<String>,
    /// Token issuer endpoint.
    pub token_issuer_url: String,
    /// Round submission endpoint.
    pub submit_round_url: String,
    /// Shared secret used to sign token requests.
    pub signing_secret: String,
    /// Maximum number of rounds waiting for the telemetry worker.
    pub queue_capacity: usize,
    /// Lobby layout.
    pub lobbies: Vec<ZoneOrigin>,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        lobbies = config.lobbies.len(),
                        submit_runs = config.submit_runs,
                        "loaded tracker config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config.with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(SUBMIT_RUNS_ENV) {
            match parse_flag(&value) {
                Some(flag) => self.submit_runs = flag,
                None => warn!(var = SUBMIT_RUNS_ENV, %value, "ignoring unrecognised flag value"),
            }
        }
        if let Some(key) = lookup(UUID_KEY_ENV).filter(|key| !key.trim().is_empty()) {
            self.uuid_key = Some(key);
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    submit_runs: bool,
    uuid_key: Option<String>,
    token_issuer_url: String,
    submit_round_url: String,
    signing_secret: String,
    queue_capacity: usize,
    lobbies: Vec<ZoneOrigin>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            submit_runs: false,
            uuid_key: None,
            token_issuer_url: DEFAULT_TOKEN_ISSUER_URL.into(),
            submit_round_url: DEFAULT_SUBMIT_ROUND_URL.into(),
            signing_secret: DEFAULT_SIGNING_SECRET.into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            lobbies: default_lobbies(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            submit_runs: value.submit_runs,
            uuid_key: value.uuid_key.filter(|key| !key.trim().is_empty()),
            token_issuer_url: value.token_issuer_url,
            submit_round_url: value.submit_round_url,
            signing_secret: value.signing_secret,
            queue_capacity: value.queue_capacity.max(1),
            lobbies: value.lobbies,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_submissions_and_use_builtin_lobbies() {
        let config = AppConfig::default();
        assert!(!config.submit_runs);
        assert_eq!(config.lobbies.len(), 10);
        assert_eq!(config.signing_secret, DEFAULT_SIGNING_SECRET);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"submit_runs":true,"uuid_key":"  ","queue_capacity":0}"#)
                .unwrap();
        let config = AppConfig::from(raw);
        assert!(config.submit_runs);
        assert_eq!(config.uuid_key, None);
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.token_issuer_url, DEFAULT_TOKEN_ISSUER_URL);
    }

    #[test]
    fn custom_lobbies_replace_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"lobbies":[{"id":1,"x":10,"y":20}]}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.lobbies, vec![ZoneOrigin { id: 1, x: 10, y: 20 }]);
    }

    #[test]
    fn environment_overrides_flags_and_key() {
        let config = AppConfig::default().with_env_overrides(|key| match key {
            SUBMIT_RUNS_ENV => Some("TRUE".into()),
            UUID_KEY_ENV => Some("link-123".into()),
            _ => None,
        });
        assert!(config.submit_runs);
        assert_eq!(config.uuid_key.as_deref(), Some("link-123"));
    }

    #[test]
    fn unrecognised_flag_value_is_ignored() {
        let config = AppConfig::default()
            .with_env_overrides(|key| (key == SUBMIT_RUNS_ENV).then(|| "maybe".into()));
        assert!(!config.submit_runs);
    }
}
