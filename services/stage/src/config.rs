//! Application Configuration Module
//!
//! Loads the stage service's runtime settings from environment variables.
//! Branding and feature toggles live in `improv_core::config` instead.

use secrecy::SecretString;
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_BRIDGE_URL: &str = "ws://127.0.0.1:7880/agent";
pub const DEFAULT_PLAYER_STORE_PATH: &str = ".improv/local_storage.json";
pub const DEFAULT_SCENARIOS_PATH: &str = "data/scenarios.json";

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub bridge_url: String,
    pub bridge_token: Option<SecretString>,
    pub player_store_path: PathBuf,
    pub scenarios_path: PathBuf,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `AGENT_BRIDGE_URL`: WebSocket endpoint of the agent bridge. Defaults to `ws://127.0.0.1:7880/agent`.
    /// *   `AGENT_BRIDGE_TOKEN`: (Optional) Bearer token sent when connecting.
    /// *   `PLAYER_STORE_PATH`: (Optional) Where the player name is remembered. Defaults to `.improv/local_storage.json`.
    /// *   `SCENARIOS_PATH`: (Optional) Scenario list for offline play. Defaults to `data/scenarios.json`.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bridge_url =
            lookup("AGENT_BRIDGE_URL").unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string());
        if !(bridge_url.starts_with("ws://") || bridge_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidValue(
                "AGENT_BRIDGE_URL".to_string(),
                format!("'{bridge_url}' is not a ws:// or wss:// URL"),
            ));
        }

        let bridge_token = lookup("AGENT_BRIDGE_TOKEN")
            .filter(|token| !token.is_empty())
            .map(SecretString::from);

        let player_store_path = lookup("PLAYER_STORE_PATH")
            .unwrap_or_else(|| DEFAULT_PLAYER_STORE_PATH.to_string())
            .into();
        let scenarios_path = lookup("SCENARIOS_PATH")
            .unwrap_or_else(|| DEFAULT_SCENARIOS_PATH.to_string())
            .into();

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bridge_url,
            bridge_token,
            player_store_path,
            scenarios_path,
            log_level,
        })
    }
}
