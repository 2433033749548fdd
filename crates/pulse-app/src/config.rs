//! Application configuration.

use crate::error::{AppError, AppResult};
use pulse_ws::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// WebSocket endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsConfig {
    /// Realtime endpoint URL without the token query parameter.
    #[serde(default = "default_ws_url")]
    pub url: String,
    /// Base delay for the first reconnect attempt (ms). Default: 1,000.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap on the reconnect delay (ms). Default: 30,000.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_ws_url() -> String {
    "wss://127.0.0.1:8443/ws/realtime".to_string()
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl From<&WsConfig> for ConnectionConfig {
    fn from(cfg: &WsConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            initial_backoff_ms: cfg.initial_backoff_ms,
            max_backoff_ms: cfg.max_backoff_ms,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ws: WsConfig,
}

impl AppConfig {
    /// Load configuration from the path in `PULSE_CONFIG`, falling back to
    /// `config/default.toml`, then to built-in defaults if neither exists.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
