//! Client and user configuration.
//!
//! `ClientConfig` describes how the HTTP layer talks to the backend. It is
//! built from defaults, optionally overlaid by `DEBO_*` environment variables.
//!
//! `Config` holds user settings persisted at `~/.config/debo/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "debo";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Remote host serving the API
pub const DEFAULT_BASE_URL: &str = "https://debo-ethiopia-api.onrender.com";

/// Path prefix all API endpoints live under
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Route the user is sent to when they must sign in again
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// HTTP request timeout in seconds.
/// The backend runs on a host that cold-starts, so allow a generous window.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for an [`crate::api::HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub timeout: Duration,
    /// Keep and forward cookies; the refresh token travels this way.
    pub with_credentials: bool,
    pub login_route: String,
    /// Backoff retries on 429. Zero means log and surface the error.
    pub rate_limit_retries: u32,
    /// Share one in-flight refresh between concurrently failing requests.
    pub shared_refresh: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            with_credentials: true,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            rate_limit_retries: 0,
            shared_refresh: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `DEBO_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Some(url) = lookup("DEBO_API_URL") {
            config.base_url = url;
        }
        if let Some(prefix) = lookup("DEBO_API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Some(secs) = lookup("DEBO_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ApiError::Configuration(format!("DEBO_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = lookup("DEBO_RATE_LIMIT_RETRIES") {
            config.rate_limit_retries = retries.parse().map_err(|_| {
                ApiError::Configuration(format!(
                    "DEBO_RATE_LIMIT_RETRIES is not a number: {retries}"
                ))
            })?;
        }
        if let Some(shared) = lookup("DEBO_SHARED_REFRESH") {
            config.shared_refresh = parse_bool(&shared).ok_or_else(|| {
                ApiError::Configuration(format!("DEBO_SHARED_REFRESH is not a boolean: {shared}"))
            })?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_rate_limit_retries(mut self, retries: u32) -> Self {
        self.rate_limit_retries = retries;
        self
    }

    pub fn with_shared_refresh(mut self, enabled: bool) -> Self {
        self.shared_refresh = enabled;
        self
    }

    /// Base URL joined with the API prefix, without a trailing slash.
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// User settings persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply persisted overrides on top of a client configuration.
    pub fn apply(&self, mut client: ClientConfig) -> ClientConfig {
        if let Some(ref url) = self.base_url {
            client.base_url = url.clone();
        }
        client
    }
}
