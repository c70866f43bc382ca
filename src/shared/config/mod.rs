//! Application configuration module
//!
//! Provides configuration types for the client: server addresses, credentials,
//! the logged-in identity and the reconnect policy. Configuration is read from
//! a TOML file and then overridden from the environment.
//!
//! ```toml
//! server_url = "http://localhost:8000"
//! token = "..."
//! request_timeout_ms = 10000
//!
//! [identity]
//! id = "7"
//! author_name = "alice"
//!
//! [reconnect]
//! max_attempts = 5
//! base_delay_ms = 1000
//! max_delay_ms = 30000
//! jitter = 0.1
//! ```

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::identity::Identity;

/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Default limit for the history fetch and the channel handshake
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Reconnect settings as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    /// Attempts after a drop before staying degraded; 0 disables reconnect
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Extra random delay as a fraction of the computed delay (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter: 0.1,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server URL for the REST endpoints
    pub server_url: String,
    /// Base URL for live channels; derived from `server_url` when absent
    pub channel_url: Option<String>,
    /// Bearer token
    pub token: Option<String>,
    /// Raw `Cookie` header value for session-authenticated servers
    pub session_cookie: Option<String>,
    /// Logged-in user
    pub identity: Option<Identity>,
    /// Time limit for the history fetch and for each channel handshake
    pub request_timeout_ms: u64,
    pub reconnect: ReconnectSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            channel_url: None,
            token: None,
            session_cookie: None,
            identity: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            reconnect: ReconnectSettings::default(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Load from the platform config directory, then apply environment overrides
    ///
    /// A missing file yields the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config = match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(&path)?
            }
            _ => Self::default(),
        };
        config.with_env_overrides()
    }

    /// `<config dir>/roomchat/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("roomchat");
            path.push("config.toml");
            path
        })
    }

    /// Apply `ROOMCHAT_*` environment variables on top of this config
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = lookup("ROOMCHAT_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(token) = lookup("ROOMCHAT_TOKEN") {
            self.token = Some(token);
        }
        if let Some(name) = lookup("ROOMCHAT_USERNAME") {
            let id = lookup("ROOMCHAT_USER_ID")
                .or_else(|| self.identity.as_ref().map(|identity| identity.id.clone()))
                .unwrap_or_default();
            let identity = Identity::new(id, name)
                .map_err(|_| ConfigError::InvalidValue("ROOMCHAT_USERNAME", "blank".to_string()))?;
            self.identity = Some(identity);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url(&self.server_url, &["http", "https"])?;
        if let Some(channel_url) = &self.channel_url {
            check_url(channel_url, &["ws", "wss"])?;
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_ms",
                "must be greater than zero".to_string(),
            ));
        }
        let reconnect = &self.reconnect;
        if !(0.0..=1.0).contains(&reconnect.jitter) {
            return Err(ConfigError::InvalidValue(
                "reconnect.jitter",
                format!("{} is outside 0.0..=1.0", reconnect.jitter),
            ));
        }
        if reconnect.base_delay_ms > reconnect.max_delay_ms {
            return Err(ConfigError::InvalidValue(
                "reconnect.base_delay_ms",
                format!(
                    "{} exceeds max_delay_ms {}",
                    reconnect.base_delay_ms, reconnect.max_delay_ms
                ),
            ));
        }
        Ok(())
    }
}

fn check_url(raw: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: scheme must be one of {:?}",
            raw, schemes
        )));
    }
    Ok(())
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    channel_url: Option<String>,
    token: Option<String>,
    session_cookie: Option<String>,
    identity: Option<Identity>,
    request_timeout_ms: Option<u64>,
    reconnect: Option<ReconnectSettings>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the live channel base URL
    pub fn channel_url(mut self, url: impl Into<String>) -> Self {
        self.channel_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn reconnect(mut self, reconnect: ReconnectSettings) -> Self {
        self.reconnect = Some(reconnect);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            server_url: self
                .server_url
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            channel_url: self.channel_url,
            token: self.token,
            session_cookie: self.session_cookie,
            identity: self.identity,
            request_timeout_ms: self
                .request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            reconnect: self.reconnect.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("could not read config: {0}")]
    Io(String),
    #[error("could not parse config: {0}")]
    Parse(String),
}
