//! Client configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.api.base_url()?;
        self.playback.validate()
    }
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all endpoints are resolved against
    pub base_url: String,
    /// Account credential sent as a bearer token
    pub access_token: Option<String>,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            access_token: None,
            connect_timeout_ms: 5000,
            user_agent: format!("reel/{}", crate::VERSION),
        }
    }
}

impl ApiConfig {
    /// Parsed base URL, always ending in `/` so relative joins keep its path
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "base_url cannot be used as a base: {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Playback session policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wall-clock period between progress reports (milliseconds)
    pub progress_interval_ms: u64,
    /// Deadline for token and manifest calls (0 = wait indefinitely)
    pub request_timeout_ms: u64,
    /// How long the presentation layer shows a fatal error before routing back
    pub error_redirect_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 10_000,
            request_timeout_ms: 0,
            error_redirect_delay_ms: 3_000,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "progress_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn error_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.error_redirect_delay_ms)
    }
}
