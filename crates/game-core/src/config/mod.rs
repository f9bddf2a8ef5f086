//! Configuration module for the SDK
//!
//! Supports YAML configuration files with `GAME_*` environment overrides, or
//! programmatic construction through [`ClientConfig`].

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::GameError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<GameConfig, GameError> {
    ConfigLoader::from_file(path).await
}
