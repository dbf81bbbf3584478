//! Configuration types for Lumina clients.
//!
//! Covers the busy-state defaults, the simulated progress ramp, the remote
//! overlay server and the account backend.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LuminaError, Result};
use crate::state::DEFAULT_MESSAGE;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "lumina.json";

/// Environment variable that overrides `auth.backendUrl`.
pub const BACKEND_URL_ENV: &str = "LUMINA_BACKEND_URL";

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_max_step() -> f64 {
    10.0
}

/// Simulated progress never goes past this on its own.
const fn default_cap() -> f64 {
    95.0
}

const fn default_fullscreen_floor() -> f64 {
    10.0
}

const fn default_port() -> u16 {
    3000
}

const fn default_heartbeat_secs() -> u64 {
    30
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_access_token_ttl_hours() -> u32 {
    24
}

const fn default_refresh_token_ttl_days() -> u32 {
    10
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Longest accepted access token lifetime (one year).
pub const MAX_ACCESS_TOKEN_TTL_HOURS: u32 = 8760;

/// Longest accepted refresh token lifetime (ten years).
pub const MAX_REFRESH_TOKEN_TTL_DAYS: u32 = 3650;

fn default_credentials_file() -> String {
    ".lumina/credentials.json".to_string()
}

/// Main configuration for a Lumina client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Message shown when an operation starts without one of its own.
    #[serde(default = "default_message")]
    pub default_message: String,

    /// Simulated progress settings used by busy hooks.
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Remote overlay server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Account backend settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_message: default_message(),
            progress: ProgressConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `lumina.json` in the current directory and falls back to
    /// defaults when it is missing.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            LuminaError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `lumina.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration. The
    /// `LUMINA_BACKEND_URL` environment variable is applied before validation.
    ///
    /// # Errors
    ///
    /// Returns `LuminaError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON, and `LuminaError::ConfigValidationError` if a
    /// value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Self>(&contents)
                .map_err(|e| LuminaError::config_parse(path, e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(LuminaError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        config.apply_backend_override(std::env::var(BACKEND_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replaces the backend URL when an override is present and non-empty.
    pub fn apply_backend_override(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|url| !url.trim().is_empty()) {
            tracing::debug!(backend_url = %url, "Backend URL overridden from environment");
            self.auth.backend_url = url;
        }
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `LuminaError::ConfigValidationError` on the first failing check.
    pub fn validate(&self) -> Result<()> {
        if self.default_message.trim().is_empty() {
            return Err(LuminaError::config_validation(
                "defaultMessage must not be empty",
                "Set defaultMessage to something like \"Loading...\" in your lumina.json",
            ));
        }

        self.progress.validate()?;

        if self.server.port == 0 {
            return Err(LuminaError::config_validation(
                "server.port must be greater than 0",
                "Set server.port to a free port such as 3000 in your lumina.json",
            ));
        }

        if self.server.heartbeat_secs == 0 {
            return Err(LuminaError::config_validation(
                "server.heartbeatSecs must be greater than 0",
                "Set server.heartbeatSecs to at least 1 in your lumina.json",
            ));
        }

        self.auth.validate()
    }
}

/// Settings for the simulated progress ramp and the fullscreen floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressConfig {
    /// Milliseconds between simulated progress ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Upper bound (exclusive) of the random increment per tick.
    #[serde(default = "default_max_step")]
    pub max_step: f64,

    /// Value at which the simulated ramp stops.
    #[serde(default = "default_cap")]
    pub cap: f64,

    /// Progress set once when a fullscreen overlay is forced.
    #[serde(default = "default_fullscreen_floor")]
    pub fullscreen_floor: f64,

    /// Optional RNG seed for reproducible ramps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_step: default_max_step(),
            cap: default_cap(),
            fullscreen_floor: default_fullscreen_floor(),
            seed: None,
        }
    }
}

impl ProgressConfig {
    /// Returns the tick interval as a `Duration`.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Returns a copy with a fixed RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(LuminaError::config_validation(
                "progress.tickIntervalMs must be greater than 0",
                "Set progress.tickIntervalMs to at least 1 (500 matches the default ramp)",
            ));
        }

        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(LuminaError::config_validation(
                "progress.maxStep must be greater than 0",
                "Set progress.maxStep to a positive number such as 10",
            ));
        }

        if self.cap.is_nan() || self.cap <= 0.0 || self.cap > 100.0 {
            return Err(LuminaError::config_validation(
                "progress.cap must be greater than 0 and at most 100",
                "Set progress.cap to 95 so completion is left to the caller",
            ));
        }

        if self.fullscreen_floor.is_nan() || self.fullscreen_floor <= 0.0 {
            return Err(LuminaError::config_validation(
                "progress.fullscreenFloor must be greater than 0",
                "Set progress.fullscreenFloor to a small positive value such as 10",
            ));
        }

        Ok(())
    }
}

/// Remote overlay server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the HTTP and WebSocket server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between WebSocket heartbeat pings.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

impl ServerConfig {
    /// Returns the heartbeat interval as a `Duration`.
    #[must_use]
    pub const fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

/// Account backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Base URL of the account backend (without the `/api/v1` prefix).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Lifetime of the access token in hours.
    #[serde(default = "default_access_token_ttl_hours")]
    pub access_token_ttl_hours: u32,

    /// Lifetime of the refresh token in days.
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: u32,

    /// Timeout for a single backend request in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where credentials are persisted between runs.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            access_token_ttl_hours: default_access_token_ttl_hours(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            request_timeout_secs: default_request_timeout_secs(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl AuthConfig {
    /// Returns the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the access token lifetime.
    #[must_use]
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.access_token_ttl_hours))
    }

    /// Returns the refresh token lifetime.
    #[must_use]
    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.refresh_token_ttl_days))
    }

    fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LuminaError::config_validation(
                format!("auth.backendUrl must be an http(s) URL, got '{url}'"),
                format!("Set auth.backendUrl in your lumina.json or export {BACKEND_URL_ENV}"),
            ));
        }

        if self.access_token_ttl_hours == 0 || self.refresh_token_ttl_days == 0 {
            return Err(LuminaError::config_validation(
                "auth token lifetimes must be greater than 0",
                "Set auth.accessTokenTtlHours and auth.refreshTokenTtlDays to at least 1",
            ));
        }

        if self.access_token_ttl_hours > MAX_ACCESS_TOKEN_TTL_HOURS
            || self.refresh_token_ttl_days > MAX_REFRESH_TOKEN_TTL_DAYS
        {
            return Err(LuminaError::config_validation(
                format!(
                    "auth token lifetimes must be at most {MAX_ACCESS_TOKEN_TTL_HOURS} hours (access) and {MAX_REFRESH_TOKEN_TTL_DAYS} days (refresh)"
                ),
                "Lower auth.accessTokenTtlHours and auth.refreshTokenTtlDays (defaults: 24 hours and 10 days)",
            ));
        }

        if self.refresh_token_ttl() <= self.access_token_ttl() {
            return Err(LuminaError::config_validation(
                "auth.refreshTokenTtlDays must outlive auth.accessTokenTtlHours",
                "Keep the refresh token longer-lived than the access token (defaults: 24 hours and 10 days)",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(LuminaError::config_validation(
                "auth.requestTimeoutSecs must be greater than 0",
                "Set auth.requestTimeoutSecs to at least 1 in your lumina.json",
            ));
        }

        if self.credentials_file.trim().is_empty() {
            return Err(LuminaError::config_validation(
                "auth.credentialsFile must not be empty",
                "Provide a path such as .lumina/credentials.json in your lumina.json",
            ));
        }

        Ok(())
    }
}
