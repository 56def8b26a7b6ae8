// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for carrier-core operations.

use thiserror::Error;

/// All possible errors that can occur in carrier-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("alert not found: {0}")]
    AlertNotFound(String),

    #[error("news item not found: {0}")]
    NewsNotFound(String),

    #[error("no current session")]
    NoSession,

    #[error("invalid sync state: '{0}'\n  hint: valid states are: local_only, pending, synced, conflict")]
    InvalidSyncState(String),

    #[error("invalid message kind: '{0}'\n  hint: valid kinds are: text, file, image, system, announcement")]
    InvalidMessageKind(String),

    #[error("invalid channel kind: '{0}'\n  hint: valid kinds are: public, private, direct, announcement")]
    InvalidChannelKind(String),

    #[error("invalid alert level: '{0}'\n  hint: valid levels are: emergency, urgent, high, normal, low")]
    InvalidAlertLevel(String),

    #[error("invalid alert kind: '{0}'")]
    InvalidAlertKind(String),

    #[error("invalid connection mode: '{0}'\n  hint: valid modes are: connected, offline, syncing, disconnected")]
    InvalidConnectionMode(String),

    #[error("invalid client id: '{0}'")]
    InvalidClientId(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("event has no client id\n  hint: synchronizable payloads must carry a durable client id")]
    MissingClientId,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for carrier-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
