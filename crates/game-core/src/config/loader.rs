//! Configuration loader for YAML files and environment overrides
//!
//! Values are resolved in three layers: built-in defaults, then the YAML
//! document, then `GAME_*` environment variables.

use std::env;
use std::path::Path;
use tokio::fs;

use crate::config::types::*;
use crate::errors::GameError;

pub const ENV_API_BASE_URL: &str = "GAME_API_BASE_URL";
pub const ENV_API_KEY: &str = "GAME_API_KEY";
pub const ENV_REQUEST_TIMEOUT: &str = "GAME_REQUEST_TIMEOUT";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<GameConfig, GameError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            GameError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string, applying process environment overrides
    pub fn from_str(content: &str) -> Result<GameConfig, GameError> {
        Self::from_str_with_env(content, |key| env::var(key).ok())
    }

    pub fn from_str_with_env<F>(content: &str, lookup: F) -> Result<GameConfig, GameError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config: GameConfig = serde_yaml::from_str(content)
            .map_err(|e| GameError::Configuration(format!("Failed to parse YAML config: {}", e)))?;
        Self::finish(config, lookup)
    }

    /// Defaults plus environment overrides, for callers without a file
    pub fn from_env() -> Result<GameConfig, GameError> {
        Self::finish(GameConfig::default(), |key| env::var(key).ok())
    }

    fn finish<F>(mut config: GameConfig, lookup: F) -> Result<GameConfig, GameError>
    where
        F: Fn(&str) -> Option<String>,
    {
        apply_env_overrides(&mut config.client, lookup)?;
        config.client.api_base_url = config.client.api_base_url.trim_end_matches('/').to_string();
        config.client.validate()?;
        log::debug!("Resolved configuration: {:?}", config.client);
        Ok(config)
    }
}

pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F) -> Result<(), GameError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_BASE_URL) {
        config.api_base_url = url;
    }
    if let Some(key) = lookup(ENV_API_KEY) {
        config.api_key = key;
    }
    if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
        config.request_timeout = raw.trim().parse::<u64>().map_err(|_| {
            GameError::Configuration(format!(
                "Invalid value for {}: {}. Must be an integer.",
                ENV_REQUEST_TIMEOUT, raw
            ))
        })?;
    }
    Ok(())
}
