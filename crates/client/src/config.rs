// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Stored as TOML, typically at `~/.config/carrier/config.toml`. Every
//! transport knob has a serde default so a minimal file only needs the
//! server URL.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};
use crate::transport::LinkConfig;

const CONFIG_DIR_NAME: &str = "carrier";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "carrier.db";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// Base URL of the server's REST API (e.g. `https://talk.example.org`).
    pub server_url: String,
    /// WebSocket URL; derived from `server_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_url: Option<String>,
    /// Path of the local store; defaults next to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Maximum reconnection attempts before degrading to offline (default: 10).
    #[serde(default = "default_reconnect_max_attempts")]
    pub reconnect_max_attempts: u32,
    /// Base reconnect backoff delay in milliseconds (default: 1000).
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum reconnect backoff delay in milliseconds (default: 60000).
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Heartbeat ping interval in milliseconds (default: 30000).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Capacity of the disconnected chat queue (default: 100).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Sync scheduler period in seconds (default: 60).
    #[serde(default = "default_sync_period_secs")]
    pub sync_period_secs: u64,
}

fn default_reconnect_max_attempts() -> u32 {
    10
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_queue_capacity() -> usize {
    100
}

fn default_sync_period_secs() -> u64 {
    60
}

impl CarrierConfig {
    /// A config pointing at the given server, everything else default.
    pub fn for_server(server_url: impl Into<String>) -> Self {
        CarrierConfig {
            server_url: server_url.into(),
            realtime_url: None,
            store_path: None,
            reconnect_max_attempts: default_reconnect_max_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            queue_capacity: default_queue_capacity(),
            sync_period_secs: default_sync_period_secs(),
        }
    }

    /// Loads a config file.
    pub fn load(path: &Path) -> ClientResult<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Writes the config file, creating parent directories.
    pub fn save(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Default config file location (`~/.config/carrier/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Resolved store path: explicit, or next to the config dir, or a
    /// local file as a last resort.
    pub fn resolved_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        dirs::data_dir().map_or_else(
            || PathBuf::from(DB_FILE_NAME),
            |dir| dir.join(CONFIG_DIR_NAME).join(DB_FILE_NAME),
        )
    }

    /// WebSocket endpoint: explicit, or derived from the REST URL
    /// (`http(s)` becomes `ws(s)`, path `/ws/chat`).
    pub fn resolved_realtime_url(&self) -> String {
        if let Some(url) = &self.realtime_url {
            return url.clone();
        }
        let base = self.server_url.trim_end_matches('/');
        let ws = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{ws}/ws/chat")
    }

    /// The transport configuration this file describes.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            url: self.resolved_realtime_url(),
            max_reconnect_attempts: self.reconnect_max_attempts,
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            jitter: Duration::from_millis(1000),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            queue_capacity: self.queue_capacity,
        }
    }

    /// Sync scheduler period.
    pub fn sync_period(&self) -> Duration {
        Duration::from_secs(self.sync_period_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
