use std::time::Duration;

use crate::client::reconnect::ReconnectPolicy;
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use crate::shared::{Identity, RoomId};

/// Runtime configuration for room views.
///
/// Wraps the validated [`AppConfig`] and derives the per-room history and
/// channel addresses from it.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        let app = AppConfig::default()
            .with_env_overrides()
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid ROOMCHAT_* environment: {}", e);
                AppConfig::default()
            });
        Self { app }
    }
}

impl From<AppConfig> for Config {
    fn from(app: AppConfig) -> Self {
        Self { app }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&String> {
        self.app.token.as_ref()
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.app.session_cookie.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.app.identity.as_ref()
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.trim_end_matches('/')
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url(), path)
    }

    /// `GET` address of a room's history snapshot
    pub fn history_url(&self, room: &RoomId) -> String {
        self.api_url(&format!("/api/rooms/{}/", room))
    }

    /// Base URL of live channels
    ///
    /// Uses `channel_url` when configured, otherwise the server URL with its
    /// scheme switched to `ws`/`wss`.
    pub fn channel_base(&self) -> String {
        if let Some(url) = &self.app.channel_url {
            return url.trim_end_matches('/').to_string();
        }
        let server = self.server_url();
        if let Some(rest) = server.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = server.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            server.to_string()
        }
    }

    /// Address of a room's live channel
    pub fn channel_url(&self, room: &RoomId) -> String {
        format!("{}/ws/chat/{}/", self.channel_base(), room)
    }

    /// Headers carrying the session context, for HTTP and the channel handshake
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(token) = self.get_token() {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        if let Some(cookie) = self.session_cookie() {
            headers.push(("Cookie", cookie.to_string()));
        }
        headers
    }

    /// Limit for the history fetch and for each channel handshake
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.app.request_timeout_ms)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::from(&self.app.reconnect)
    }
}
