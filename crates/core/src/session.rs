// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Current-session entity and connection mode.
//!
//! Exactly one session row exists at a time; creating a new session clears
//! the previous one. The session carries the bearer token attached to every
//! authenticated Remote API call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identity::ServerId;

/// Application connection modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Connected to the server.
    Connected,
    /// Working in standalone offline mode.
    Offline,
    /// Currently reconciling with the server.
    Syncing,
    /// Was connected but lost the connection.
    Disconnected,
}

impl ConnectionMode {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Connected => "connected",
            ConnectionMode::Offline => "offline",
            ConnectionMode::Syncing => "syncing",
            ConnectionMode::Disconnected => "disconnected",
        }
    }

    /// True if the Remote API can be called right now.
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionMode::Connected | ConnectionMode::Syncing)
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "connected" => Ok(ConnectionMode::Connected),
            "offline" => Ok(ConnectionMode::Offline),
            "syncing" => Ok(ConnectionMode::Syncing),
            "disconnected" => Ok(ConnectionMode::Disconnected),
            _ => Err(Error::InvalidConnectionMode(s.to_string())),
        }
    }
}

/// The persisted current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Server user id; absent for offline-only sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ServerId>,
    /// Login name.
    pub username: String,
    /// Display name shown on authored entities.
    pub display_name: String,
    /// Bearer token for the Remote API; absent offline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Base URL of the server.
    pub server_url: String,
    /// Last known connection mode.
    pub mode: ConnectionMode,
    /// Last time a connection was established.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<DateTime<Utc>>,
    /// When the token expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Keep offline access after the token expires.
    pub remember: bool,
}

impl Session {
    /// Creates an authenticated session.
    pub fn authenticated(
        user_id: ServerId,
        username: impl Into<String>,
        display_name: impl Into<String>,
        token: impl Into<String>,
        server_url: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Session {
            user_id: Some(user_id),
            username: username.into(),
            display_name: display_name.into(),
            token: Some(token.into()),
            server_url: server_url.into(),
            mode: ConnectionMode::Connected,
            last_connected: Some(now),
            expires_at,
            remember: false,
        }
    }

    /// Creates an offline-only session (no token, no server round trip).
    pub fn offline(username: impl Into<String>, server_url: impl Into<String>) -> Self {
        let username = username.into();
        Session {
            user_id: None,
            username: username.clone(),
            display_name: username,
            token: None,
            server_url: server_url.into(),
            mode: ConnectionMode::Offline,
            last_connected: None,
            expires_at: None,
            remember: false,
        }
    }

    /// True while the token can still be presented to the server.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expires_at) {
            (Some(_), Some(expiry)) => now < expiry,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
