//! Client configuration.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::sync::SyncConfig;

/// Configuration for one client session.
///
/// The polling cadences are part of the Match Service contract; the
/// defaults below are the contract values. Tests compress them.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Match Service.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Alias sent at device registration.
    #[serde(default = "default_alias")]
    alias: String,

    /// Waiting-status poll period in milliseconds.
    #[serde(default = "default_waiting_poll_ms")]
    waiting_poll_ms: u64,

    /// Game-state poll period in milliseconds.
    #[serde(default = "default_game_poll_ms")]
    game_poll_ms: u64,

    /// Game-state poll period after a transient failure.
    #[serde(default = "default_game_poll_backoff_ms")]
    game_poll_backoff_ms: u64,

    /// Keep-alive probe period in milliseconds.
    #[serde(default = "default_keep_alive_ms")]
    keep_alive_ms: u64,
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_alias() -> String {
    "Player".to_string()
}

fn default_waiting_poll_ms() -> u64 {
    2000
}

fn default_game_poll_ms() -> u64 {
    1000
}

fn default_game_poll_backoff_ms() -> u64 {
    2000
}

fn default_keep_alive_ms() -> u64 {
    30000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            alias: default_alias(),
            waiting_poll_ms: default_waiting_poll_ms(),
            game_poll_ms: default_game_poll_ms(),
            game_poll_backoff_ms: default_game_poll_backoff_ms(),
            keep_alive_ms: default_keep_alive_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file. Missing fields take their
    /// defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("failed to parse config: {}", e)))?;

        info!(server_url = %config.server_url, "config loaded");
        Ok(config)
    }

    /// Builds configuration from the environment, loading a `.env` file
    /// if present. `GRIDMATCH_SERVER_URL` and `GRIDMATCH_ALIAS` override
    /// the defaults.
    #[instrument]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GRIDMATCH_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(alias) = std::env::var("GRIDMATCH_ALIAS") {
            config.alias = alias;
        }
        debug!(server_url = %config.server_url, "config from environment");
        config
    }

    /// The poll cadences as durations for the sync driver.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            waiting_poll: Duration::from_millis(self.waiting_poll_ms),
            game_poll: Duration::from_millis(self.game_poll_ms),
            game_poll_backoff: Duration::from_millis(self.game_poll_backoff_ms),
            keep_alive: Duration::from_millis(self.keep_alive_ms),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where the error was raised.
    pub line: u32,
    /// Source file where the error was raised.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error at the caller's location.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
