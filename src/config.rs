//! Configuration loading.
//!
//! Loads courier configuration from `./config.toml` (or the file named by
//! `$COURIER_CONFIG_PATH`). Environment variables override file values; file
//! values override defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::action::executor::DEFAULT_MAX_ATTEMPTS;

/// Top-level courier configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Chat service endpoint settings (`[chat]`).
    pub chat: ChatConfig,
    /// HTTP transport timeouts (`[http]`).
    pub http: HttpConfig,
    /// Attempt-loop settings (`[retry]`).
    pub retry: RetryConfig,
}

/// Chat service endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// API root of the chat service, e.g. `https://chat.example.com`.
    pub base_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_owned(),
        }
    }
}

/// HTTP transport timeouts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Attempt-loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Cap on send attempts per action. The null-acknowledgement anomaly is
    /// believed self-correcting, so this mostly guards against a server that
    /// keeps producing it indefinitely.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl CourierConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$COURIER_CONFIG_PATH` or `./config.toml`. A missing
    /// file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, without env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when the TOML does not parse or fails validation.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: CourierConfig =
            toml::from_str(contents).context("failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: CourierConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(CourierConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve the config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("COURIER_CONFIG_PATH")
            .map_or_else(|| PathBuf::from("config.toml"), PathBuf::from)
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("COURIER_BASE_URL") {
            self.chat.base_url = v;
        }
        if let Some(v) = env("COURIER_MAX_ATTEMPTS") {
            match v.parse() {
                Ok(n) => self.retry.max_attempts = n,
                Err(_) => tracing::warn!(
                    var = "COURIER_MAX_ATTEMPTS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("COURIER_CONNECT_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.http.connect_timeout_secs = n,
                Err(_) => tracing::warn!(
                    var = "COURIER_CONNECT_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("COURIER_REQUEST_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.http.request_timeout_secs = n,
                Err(_) => tracing::warn!(
                    var = "COURIER_REQUEST_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error when the chat base URL does not parse as an absolute
    /// URL or the attempt cap is zero.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.chat.base_url)
            .with_context(|| format!("chat.base_url is not a valid URL: {}", self.chat.base_url))?;
        anyhow::ensure!(self.retry.max_attempts >= 1, "retry.max_attempts must be at least 1");
        Ok(())
    }
}
