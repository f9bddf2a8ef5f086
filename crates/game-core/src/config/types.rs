//! Configuration type definitions for the SDK
//!
//! A configuration file is optional: every field has a default except the
//! API key, which usually comes from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::GameError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.virtuals.io";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GameConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    #[serde(default)]
    pub agent: Option<AgentDefinition>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the GAME API.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Seconds allowed for token exchange and registration calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Identity of the agent registered with the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = seconds;
        self
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(GameError::Configuration(format!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }
        if self.request_timeout == 0 {
            return Err(GameError::Configuration(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &redact(&self.api_key))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        "<unset>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
